//! Chapter sources and the multi-source merge.
//!
//! A [`ChapterProvider`] produces one [`ComicInfoChapter`] for a set of
//! inputs. Declarative definitions are adapted through
//! [`DeclarativeProvider`]; hand-written clients can implement the trait
//! directly and take part in the same merge.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use yuzu_common::{merge, ComicInfoChapter, Result};

use super::definition::Provider;
use super::engine::{Engine, Inputs};

/// A source of chapter metadata.
#[async_trait]
pub trait ChapterProvider: Send + Sync {
    /// Name used in log lines.
    fn name(&self) -> &str;

    /// Fetch the chapter record for `inputs`.
    async fn chapter(&self, inputs: &Inputs) -> Result<ComicInfoChapter>;
}

/// Runs a declarative [`Provider`] and reads its projection as a chapter
/// record keyed by ComicInfo element names.
pub struct DeclarativeProvider {
    engine: Engine,
    provider: Arc<Provider>,
}

impl DeclarativeProvider {
    pub fn new(engine: Engine, provider: Arc<Provider>) -> Self {
        Self { engine, provider }
    }
}

#[async_trait]
impl ChapterProvider for DeclarativeProvider {
    fn name(&self) -> &str {
        &self.provider.id
    }

    async fn chapter(&self, inputs: &Inputs) -> Result<ComicInfoChapter> {
        let projection = self.engine.execute(&self.provider, inputs).await?;
        Engine::chapter_from_projection(&self.provider, &projection)
    }
}

/// Query every source in order and merge the records, the first non-empty
/// value per field winning.
///
/// Sources run one after another. The first failure is returned and no
/// partial merge is produced.
pub async fn merged_chapter(
    sources: &[Box<dyn ChapterProvider>],
    inputs: &Inputs,
) -> Result<ComicInfoChapter> {
    let mut records = Vec::with_capacity(sources.len());
    for source in sources {
        let record = source.chapter(inputs).await?;
        debug!(
            provider = source.name(),
            fields = record.set_count(),
            "chapter record fetched"
        );
        records.push(record);
    }
    Ok(merge(&records))
}
