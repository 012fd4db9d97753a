//! Reads the root document and every document its `$ref`s reach.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use serde_json::Value;
use url::Url;

use o2p_core::document::DocumentSet;
use o2p_core::parse;

/// Fetches documents from the local filesystem or over HTTP.
pub struct Loader {
    client: Client,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Load `input` (a path or an http(s) URL) and everything it references.
    pub fn load(&self, input: &str) -> Result<DocumentSet> {
        let root = input_url(input)?;
        let mut documents = DocumentSet::new(root.as_str(), self.fetch(&root)?)
            .with_context(|| format!("invalid document URI {root}"))?;

        loop {
            let missing = documents.missing_documents();
            if missing.is_empty() {
                break;
            }
            for uri in missing {
                log::debug!("loading referenced document {uri}");
                let url = Url::parse(&uri).with_context(|| format!("invalid document URI {uri}"))?;
                let document = self.fetch(&url)?;
                documents
                    .insert(&uri, document)
                    .with_context(|| format!("invalid document URI {uri}"))?;
            }
        }
        Ok(documents)
    }

    fn fetch(&self, url: &Url) -> Result<Value> {
        let content = match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| anyhow::anyhow!("{url} is not a local path"))?;
                fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?
            }
            "http" | "https" => {
                let resp = self
                    .client
                    .get(url.as_str())
                    .send()
                    .with_context(|| format!("failed to fetch {url}"))?;
                if !resp.status().is_success() {
                    bail!("failed to fetch {url}: HTTP {}", resp.status());
                }
                resp.text()
                    .with_context(|| format!("failed to read response from {url}"))?
            }
            scheme => bail!("unsupported URI scheme `{scheme}` in {url}"),
        };
        decode(url, &content)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON when the path says so, YAML otherwise (YAML also accepts JSON).
fn decode(url: &Url, content: &str) -> Result<Value> {
    let decoded = if url.path().ends_with(".json") {
        parse::decode_json(content)
    } else {
        parse::decode_yaml(content)
    };
    decoded.with_context(|| format!("failed to parse {url}"))
}

fn input_url(input: &str) -> Result<Url> {
    if input.starts_with("http://") || input.starts_with("https://") {
        return Url::parse(input).with_context(|| format!("invalid URL {input}"));
    }
    let path = Path::new(input);
    let absolute = fs::canonicalize(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Url::from_file_path(&absolute)
        .map_err(|()| anyhow::anyhow!("cannot address {} as a URL", absolute.display()))
}
