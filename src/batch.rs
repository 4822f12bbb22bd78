//! Parallel extraction over many fetched pages
//!
//! Parsing and tree walking are CPU-bound, so pages are spread over a rayon
//! pool. Each worker parses its own [`Document`]; the schema is shared.

use rayon::prelude::*;
use rayon::{ThreadPoolBuildError, ThreadPoolBuilder};

use crate::document::Document;
use crate::extractors::{extract, Extraction};
use crate::schema::SelectorSchema;

/// Extract every page with `schema`, using `workers` threads.
///
/// `workers == 0` lets rayon size the pool to the available cores.
/// Results are returned in input order.
pub fn extract_pages<S>(
    pages: &[S],
    schema: &SelectorSchema,
    workers: usize,
) -> Result<Vec<Extraction>, ThreadPoolBuildError>
where
    S: AsRef<str> + Sync,
{
    let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;
    tracing::debug!(pages = pages.len(), threads = pool.current_num_threads(), "extracting pages");

    Ok(pool.install(|| {
        pages
            .par_iter()
            .map(|html| {
                let doc = Document::parse(html.as_ref());
                extract(&doc, schema, None)
            })
            .collect()
    }))
}
