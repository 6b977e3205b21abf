use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::source::{DataSource, SourceError, SourceResult};
use super::{
    Catalogs, Evaluation, Filter, JudgeScore, Model, ModelRunReport, Project, RunOutcome,
    TestResult,
};

/// Backend talking to the evaluation REST API.
pub struct HttpSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpSource {
    pub fn new(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }

    fn endpoint(&self, segments: &[&str]) -> SourceResult<Url> {
        endpoint_url(&self.base, segments)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> SourceResult<T> {
        let url = self.endpoint(segments)?;
        debug!("GET {}", url);
        let resp = self.client.get(url).send().await?;
        let resp = ensure_success(resp).await?;
        Ok(resp.json().await?)
    }
}

/// `base` with `segments` appended, each percent-encoded as one path segment.
pub(crate) fn endpoint_url(base: &Url, segments: &[&str]) -> SourceResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| SourceError::Transport(format!("{} cannot be used as an API base", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn ensure_success(resp: reqwest::Response) -> SourceResult<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp.text().await.unwrap_or_default();
    warn!("{} returned {}", url, status);
    Err(SourceError::Transport(format!(
        "{} returned {}: {}",
        url,
        status,
        body.chars().take(200).collect::<String>()
    )))
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch_catalogs(&self) -> SourceResult<Catalogs> {
        let (projects, models) = tokio::try_join!(
            self.get_json::<Vec<Project>>(&["projects"]),
            self.get_json::<Vec<Model>>(&["models"]),
        )?;
        Ok(Catalogs { projects, models })
    }

    async fn fetch_evaluations(&self, filter: &Filter) -> SourceResult<Vec<Evaluation>> {
        let mut url = self.endpoint(&["evaluations"])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(project) = filter.project_id.as_deref() {
                query.append_pair("project", project);
            }
            if let Some(status) = filter.status {
                query.append_pair("status", status.as_str());
            }
            if let Some(model) = filter.model.as_deref() {
                query.append_pair("model", model);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        let resp = self.client.get(url).send().await?;
        Ok(ensure_success(resp).await?.json().await?)
    }

    async fn fetch_test_results(&self, eval_id: &str) -> SourceResult<Vec<TestResult>> {
        self.get_json(&["evaluations", eval_id, "results"]).await
    }

    async fn fetch_logs(&self, eval_id: &str) -> SourceResult<String> {
        let resp = self
            .client
            .get(self.endpoint(&["evaluations", eval_id, "logs"])?)
            .send()
            .await?;
        Ok(ensure_success(resp).await?.text().await?)
    }

    async fn fetch_judge_score(&self, eval_id: &str) -> SourceResult<Option<JudgeScore>> {
        let resp = self
            .client
            .get(self.endpoint(&["evaluations", eval_id, "judge"])?)
            .send()
            .await?;
        // Unscored evaluations answer 404 or a JSON null.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(ensure_success(resp).await?.json().await?)
    }

    async fn submit_run(
        &self,
        eval_id: &str,
        prompt: &str,
        user_input: &str,
    ) -> SourceResult<RunOutcome> {
        let resp = self
            .client
            .post(self.endpoint(&["evaluations", eval_id, "run"])?)
            .json(&serde_json::json!({
                "prompt": prompt,
                "user_input": user_input,
            }))
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json().await?)
    }

    async fn submit_model_run(
        &self,
        model: &Model,
        prompt: &str,
        user_input: &str,
    ) -> SourceResult<ModelRunReport> {
        let resp = self
            .client
            .post(self.endpoint(&["comparisons", "run"])?)
            .json(&serde_json::json!({
                "model": model.id,
                "prompt": prompt,
                "input": user_input,
            }))
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json().await?)
    }
}
