//! Import Orchestrator — fetch → prompt → generate → parse → create.
//!
//! The store is touched exactly once, at the end, after the extraction has been
//! validated. Any earlier failure leaves no trace in the database.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::applications::store::ApplicationStore;
use crate::errors::AppError;
use crate::importer::fetcher::{FetchError, PageFetcher};
use crate::importer::parser::{parse_extraction, ParseError};
use crate::importer::prompts::build_import_prompt;
use crate::llm_client::{LlmError, TextGenerator};
use crate::models::application::{parse_apply_time, Application, ApplicationStatus};

/// Stage-specific import failures. Callers only ever see "import failed";
/// the variants exist for logs and tests.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("page fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("extraction service failed: {0}")]
    Service(#[from] LlmError),

    #[error("extraction response unparseable: {0}")]
    Parse(#[from] ParseError),

    #[error("extraction yielded no company name")]
    Incomplete,

    #[error("persisting imported application failed: {0}")]
    Store(Box<AppError>),
}

impl ImportError {
    pub fn stage(&self) -> &'static str {
        match self {
            ImportError::Fetch(_) => "fetch",
            ImportError::Service(_) => "service",
            ImportError::Parse(_) => "parse",
            ImportError::Incomplete => "incomplete",
            ImportError::Store(_) => "store",
        }
    }
}

impl From<AppError> for ImportError {
    fn from(e: AppError) -> Self {
        ImportError::Store(Box::new(e))
    }
}

pub struct Importer {
    fetcher: Arc<dyn PageFetcher>,
    generator: Arc<dyn TextGenerator>,
    store: ApplicationStore,
}

impl Importer {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        generator: Arc<dyn TextGenerator>,
        store: ApplicationStore,
    ) -> Self {
        Self {
            fetcher,
            generator,
            store,
        }
    }

    /// Imports the posting at `url`. `requested_status` wins over whatever the model extracted.
    pub async fn import_from_link(
        &self,
        url: &str,
        requested_status: Option<ApplicationStatus>,
    ) -> Result<Application, ImportError> {
        let page_text = self.fetcher.fetch_text(url).await?;
        info!(url, text_chars = page_text.chars().count(), "Fetched job posting");

        let prompt = build_import_prompt(url, &page_text);
        let raw = self.generator.generate(&prompt).await?;

        let mut input = parse_extraction(&raw, url)?;
        if input.company_name.trim().is_empty() {
            return Err(ImportError::Incomplete);
        }

        let status = requested_status
            .or_else(|| parsed_status(input.status.as_deref()))
            .unwrap_or_default();
        input.status = Some(status.as_str().to_string());

        if let Some(raw_time) = input.apply_time.take() {
            if parse_apply_time(&raw_time).is_some() {
                input.apply_time = Some(raw_time);
            } else {
                warn!(url, apply_time = %raw_time, "Dropping unparseable extracted applyTime");
            }
        }

        let application = self.store.create(input).await?;
        info!(
            url,
            application_id = application.id,
            status = %application.status,
            "Imported application"
        );
        Ok(application)
    }
}

fn parsed_status(raw: Option<&str>) -> Option<ApplicationStatus> {
    let raw = raw?;
    match raw.parse() {
        Ok(status) => Some(status),
        Err(e) => {
            warn!("Ignoring extracted status: {e}");
            None
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{StubFetcher, StubGenerator};
    use super::*;
    use crate::db::create_pool;
    use crate::models::application::ApplicationFilter;

    const URL: &str = "https://careers.acme.example/jobs/42";

    async fn importer(
        page: Option<&str>,
        generator: Arc<StubGenerator>,
    ) -> (Importer, ApplicationStore) {
        let store = ApplicationStore::new(create_pool("sqlite::memory:").await.unwrap());
        let fetcher = Arc::new(StubFetcher {
            text: page.map(String::from),
        });
        (Importer::new(fetcher, generator, store.clone()), store)
    }

    async fn row_count(store: &ApplicationStore) -> usize {
        store
            .list(&ApplicationFilter::default())
            .await
            .unwrap()
            .len()
    }

    #[tokio::test]
    async fn test_import_persists_extracted_fields_and_skills() {
        let generator = Arc::new(StubGenerator::replying(
            r#"Sure! {"companyName":"Acme","jobTitle":"Rust Engineer","location":"Remote",
               "status":"applied","applyTime":"2024-06-01","softSkills":"Mentoring",
               "skills":"Rust, Tokio"}"#,
        ));
        let (importer, store) = importer(Some("Rust Engineer at Acme"), generator.clone()).await;

        let app = importer.import_from_link(URL, None).await.unwrap();
        assert_eq!(app.company_name, "Acme");
        assert_eq!(app.job_title.as_deref(), Some("Rust Engineer"));
        assert_eq!(app.source_url.as_deref(), Some(URL));
        assert_eq!(app.status, ApplicationStatus::Applied);
        assert!(app.apply_time.is_some());

        let detail = store.get_detail(app.id).await.unwrap().unwrap();
        assert_eq!(detail.soft_skills, vec!["Mentoring"]);
        assert_eq!(detail.skills, vec!["Rust", "Tokio"]);

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(URL));
        assert!(prompts[0].contains("Rust Engineer at Acme"));
    }

    #[tokio::test]
    async fn test_requested_status_overrides_extracted_status() {
        let generator = Arc::new(StubGenerator::replying(
            r#"{"companyName":"Acme","status":"applied"}"#,
        ));
        let (importer, _) = importer(Some("page"), generator).await;

        let app = importer
            .import_from_link(URL, Some(ApplicationStatus::Interview))
            .await
            .unwrap();
        assert_eq!(app.status, ApplicationStatus::Interview);
    }

    #[tokio::test]
    async fn test_invalid_extracted_status_falls_back_to_applied() {
        let generator = Arc::new(StubGenerator::replying(
            r#"{"companyName":"Acme","status":"offer","applyTime":"someday"}"#,
        ));
        let (importer, _) = importer(Some("page"), generator).await;

        let app = importer.import_from_link(URL, None).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::Applied);
        assert_eq!(app.apply_time, None);
    }

    #[tokio::test]
    async fn test_missing_company_name_fails_without_writing() {
        for response in [r#"{"jobTitle":"Engineer"}"#, r#"{"companyName":"   "}"#] {
            let generator = Arc::new(StubGenerator::replying(response));
            let (importer, store) = importer(Some("page"), generator).await;

            let err = importer.import_from_link(URL, None).await.unwrap_err();
            assert!(matches!(err, ImportError::Incomplete));
            assert_eq!(row_count(&store).await, 0);
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_model_call() {
        let generator = Arc::new(StubGenerator::replying(r#"{"companyName":"Acme"}"#));
        let (importer, store) = importer(None, generator.clone()).await;

        let err = importer.import_from_link(URL, None).await.unwrap_err();
        assert_eq!(err.stage(), "fetch");
        assert!(generator.prompts.lock().unwrap().is_empty());
        assert_eq!(row_count(&store).await, 0);
    }

    #[tokio::test]
    async fn test_service_and_parse_failures_write_nothing() {
        let (importer_a, store_a) = importer(Some("page"), Arc::new(StubGenerator::failing())).await;
        let err = importer_a.import_from_link(URL, None).await.unwrap_err();
        assert_eq!(err.stage(), "service");
        assert_eq!(row_count(&store_a).await, 0);

        let (importer_b, store_b) =
            importer(Some("page"), Arc::new(StubGenerator::replying("no json here"))).await;
        let err = importer_b.import_from_link(URL, None).await.unwrap_err();
        assert_eq!(err.stage(), "parse");
        assert_eq!(row_count(&store_b).await, 0);
    }
}
