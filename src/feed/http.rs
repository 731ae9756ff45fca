use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};

use super::{PositionFeed, PositionQuery};
use crate::core::config::FeedConfig;
use crate::vessels::VesselRecord;
use crate::{Error, Result};

/// Shared HTTP client with the default feed settings
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    let config = FeedConfig::default();
    Client::builder()
        .user_agent(config.user_agent)
        .timeout(config.timeout)
        .build()
        .expect("failed to build reqwest client")
});

/// Position feed served over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPositionFeed {
    base_url: String,
    client: Client,
}

impl HttpPositionFeed {
    /// Feed at `base_url` using the shared default client
    pub fn from_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_base(base_url.into()),
            client: HTTP_CLIENT.clone(),
        }
    }

    /// Feed with its own client built from `config`
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            base_url: trim_base(config.base_url.clone()),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[async_trait]
impl PositionFeed for HttpPositionFeed {
    async fn positions(&self, query: &PositionQuery) -> Result<Vec<VesselRecord>> {
        let url = format!("{}/v1/vessels/position/all", self.base_url);
        log::debug!("fetch {} positions within {:?}", query.category, query.bounds);

        let resp = self
            .client
            .get(&url)
            .query(&query.query_pairs())
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Error::Http {
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.json::<Vec<VesselRecord>>().await?)
    }

    async fn position(&self, id: &str) -> Result<Option<VesselRecord>> {
        let Ok(mmsi) = id.trim().parse::<u32>() else {
            log::debug!("not looking up malformed vessel id {:?}", id);
            return Ok(None);
        };
        let url = format!("{}/v1/vessels/position/{}", self.base_url, mmsi);
        log::debug!("lookup vessel {}", mmsi);

        let resp = self.client.get(&url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(Error::Http {
                status: resp.status().as_u16(),
            });
        }
        Ok(Some(resp.json::<VesselRecord>().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let feed = HttpPositionFeed::from_base_url("https://ais.example.org/");
        assert_eq!(feed.base_url(), "https://ais.example.org");

        let config = FeedConfig {
            base_url: "http://localhost:9000//".to_string(),
            ..FeedConfig::default()
        };
        assert_eq!(HttpPositionFeed::new(&config).unwrap().base_url(), "http://localhost:9000");
    }

    #[tokio::test]
    async fn malformed_id_is_not_requested() {
        let feed = HttpPositionFeed::from_base_url("http://127.0.0.1:9");
        for id in ["../all", "a/b", ""] {
            assert!(feed.position(id).await.unwrap().is_none(), "{id}");
        }
    }
}
