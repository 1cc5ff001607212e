//! Chef-style REST server
//!
//! Maps the repository layout onto server endpoints:
//!
//! | Entry path | Endpoint |
//! |------------|----------|
//! | `/roles`, `/nodes`, `/environments`, `/clients`, `/users` | `GET /<collection>` |
//! | `/roles/<name>.json` | `/roles/<name>` |
//! | `/data_bags/<bag>` | `/data/<bag>` |
//! | `/data_bags/<bag>/<item>.json` | `/data/<bag>/<item>` |
//! | `/cookbooks/<name>/...` | files of `/cookbooks/<name>/_latest` (read only) |

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use knife_fs::EntryPath;
use reqwest::Method;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde_json::Value;
use tracing::{debug, warn};

use crate::store::{RemoteChild, RemoteStore};
use crate::{Result, StoreError};

const JSON_SUFFIX: &str = ".json";

/// Top-level directories and the endpoints behind them.
const COLLECTIONS: &[(&str, &str)] = &[
    ("clients", "clients"),
    ("cookbooks", "cookbooks"),
    ("data_bags", "data"),
    ("environments", "environments"),
    ("nodes", "nodes"),
    ("roles", "roles"),
    ("users", "users"),
];

/// Connection settings for a [`RestStore`].
#[derive(Debug, Clone)]
pub struct RestOptions {
    /// Sent as `X-Ops-UserId` when set
    pub client_name: Option<String>,
    /// Total time spent retrying transient failures
    pub retry_max_elapsed: Duration,
}

impl Default for RestOptions {
    fn default() -> Self {
        Self {
            client_name: None,
            retry_max_elapsed: Duration::from_secs(5),
        }
    }
}

/// Where an entry path lands on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resource<'a> {
    Root,
    Collection { endpoint: &'static str },
    Object { endpoint: &'static str, name: &'a str },
    DataBag { bag: &'a str },
    DataBagItem { bag: &'a str, item: &'a str },
    Cookbook { name: &'a str, rel: String },
}

impl<'a> Resource<'a> {
    fn parse(path: &'a EntryPath) -> Option<Self> {
        let segments: Vec<&str> = path.segments().collect();
        let Some(first) = segments.first() else {
            return Some(Self::Root);
        };
        let endpoint = COLLECTIONS
            .iter()
            .find(|(dir, _)| dir == first)
            .map(|(_, endpoint)| *endpoint)?;

        match (*first, &segments[1..]) {
            (_, []) => Some(Self::Collection { endpoint }),
            ("data_bags", &[bag]) => Some(Self::DataBag { bag }),
            ("data_bags", &[bag, item]) => Some(Self::DataBagItem {
                bag,
                item: item.strip_suffix(JSON_SUFFIX)?,
            }),
            ("data_bags", _) => None,
            ("cookbooks", &[name, ref rest @ ..]) => Some(Self::Cookbook {
                name,
                rel: rest.join("/"),
            }),
            (_, &[leaf]) => Some(Self::Object {
                endpoint,
                name: leaf.strip_suffix(JSON_SUFFIX)?,
            }),
            _ => None,
        }
    }
}

/// One file of a cookbook manifest.
#[derive(Debug, Clone)]
struct CookbookFile {
    path: String,
    url: String,
}

/// A blocking client for a Chef-style REST API.
#[derive(Debug)]
pub struct RestStore {
    client: Client,
    base_url: String,
    options: RestOptions,
    manifests: RefCell<HashMap<String, Vec<CookbookFile>>>,
}

impl RestStore {
    pub fn new(base_url: &str, options: RestOptions) -> Result<Self> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(StoreError::UnsupportedUrl {
                url: base_url.to_string(),
            });
        }
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            options,
            manifests: RefCell::new(HashMap::new()),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// Send one request, retrying connection failures and 5xx responses, and
    /// map the final status onto a store error.
    fn send(&self, method: Method, url: &str, body: Option<&Value>, path: &EntryPath) -> Result<Response> {
        let policy = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(self.options.retry_max_elapsed))
            .build();

        let attempt = || {
            let mut request = self
                .client
                .request(method.clone(), url)
                .header("Accept", "application/json");
            if let Some(name) = &self.options.client_name {
                request = request.header("X-Ops-UserId", name);
            }
            if let Some(body) = body {
                request = request.json(body);
            }
            debug!(%method, url, "remote request");

            match request.send() {
                Ok(response) if response.status().is_server_error() => {
                    warn!(%method, url, status = %response.status(), "server error, retrying");
                    Err(backoff::Error::transient(http_error(path, response)))
                }
                Ok(response) => Ok(response),
                Err(e) if e.is_connect() || e.is_timeout() => {
                    warn!(%method, url, error = %e, "connection failed, retrying");
                    Err(backoff::Error::transient(StoreError::Transport(e)))
                }
                Err(e) => Err(backoff::Error::permanent(StoreError::Transport(e))),
            }
        };

        let response = backoff::retry(policy, attempt).map_err(|e| match e {
            backoff::Error::Permanent(err) => err,
            backoff::Error::Transient { err, .. } => err,
        })?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(StoreError::not_found(path)),
            StatusCode::FORBIDDEN | StatusCode::METHOD_NOT_ALLOWED => {
                Err(StoreError::not_allowed(path, "is not allowed by the server"))
            }
            StatusCode::CONFLICT => Err(StoreError::Conflict {
                path: path.to_string(),
                message: response.text().unwrap_or_default(),
            }),
            _ => Err(http_error(path, response)),
        }
    }

    fn get_json(&self, endpoint: &str, path: &EntryPath) -> Result<Value> {
        let response = self.send(Method::GET, &self.url(endpoint), None, path)?;
        Ok(response.json()?)
    }

    /// Names in a collection response: either an object keyed by name or an
    /// array of names.
    fn list_names(&self, endpoint: &str, path: &EntryPath) -> Result<Vec<String>> {
        let mut names: Vec<String> = match self.get_json(endpoint, path)? {
            Value::Object(map) => map.keys().cloned().collect(),
            Value::Array(items) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(name) => Some(name.clone()),
                    Value::Object(obj) => obj
                        .get("name")
                        .or_else(|| obj.get("username"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        names.sort();
        Ok(names)
    }

    fn cookbook_files(&self, name: &str, path: &EntryPath) -> Result<Vec<CookbookFile>> {
        if let Some(files) = self.manifests.borrow().get(name) {
            return Ok(files.clone());
        }
        let manifest = self.get_json(&format!("cookbooks/{name}/_latest"), path)?;
        let files = manifest_files(&manifest);
        self.manifests
            .borrow_mut()
            .insert(name.to_string(), files.clone());
        Ok(files)
    }

    fn put_or_post(&self, object: &str, collection: &str, content: &[u8], path: &EntryPath) -> Result<()> {
        let body: Value = serde_json::from_slice(content).map_err(|e| {
            StoreError::not_allowed(path, format!("is not valid JSON: {e}"))
        })?;
        match self.send(Method::PUT, &self.url(object), Some(&body), path) {
            Err(StoreError::NotFound { .. }) => {
                debug!(%path, "object missing, creating");
                self.send(Method::POST, &self.url(collection), Some(&body), path)?;
                Ok(())
            }
            other => other.map(|_| ()),
        }
    }
}

impl RemoteStore for RestStore {
    fn location(&self) -> String {
        self.base_url.clone()
    }

    fn list(&self, path: &EntryPath) -> Result<Vec<RemoteChild>> {
        let resource = Resource::parse(path).ok_or_else(|| StoreError::not_found(path))?;
        match resource {
            Resource::Root => Ok(COLLECTIONS
                .iter()
                .map(|(dir, _)| RemoteChild::dir(*dir))
                .collect()),
            Resource::Collection {
                endpoint: endpoint @ ("data" | "cookbooks"),
            } => Ok(self
                .list_names(endpoint, path)?
                .into_iter()
                .map(RemoteChild::dir)
                .collect()),
            Resource::Collection { endpoint } => Ok(self
                .list_names(endpoint, path)?
                .into_iter()
                .map(|name| RemoteChild::leaf(format!("{name}{JSON_SUFFIX}")))
                .collect()),
            Resource::DataBag { bag } => Ok(self
                .list_names(&format!("data/{bag}"), path)?
                .into_iter()
                .map(|item| RemoteChild::leaf(format!("{item}{JSON_SUFFIX}")))
                .collect()),
            Resource::Cookbook { name, rel } => {
                let files = self.cookbook_files(name, path)?;
                cookbook_children(&files, &rel).ok_or_else(|| {
                    if files.iter().any(|f| f.path == rel) {
                        StoreError::NotADirectory {
                            path: path.to_string(),
                        }
                    } else {
                        StoreError::not_found(path)
                    }
                })
            }
            Resource::Object { .. } | Resource::DataBagItem { .. } => Err(StoreError::NotADirectory {
                path: path.to_string(),
            }),
        }
    }

    fn read(&self, path: &EntryPath) -> Result<Vec<u8>> {
        let resource = Resource::parse(path).ok_or_else(|| StoreError::not_found(path))?;
        let value = match resource {
            Resource::Object { endpoint, name } => self.get_json(&format!("{endpoint}/{name}"), path)?,
            Resource::DataBagItem { bag, item } => self.get_json(&format!("data/{bag}/{item}"), path)?,
            Resource::Cookbook { name, rel } => {
                let files = self.cookbook_files(name, path)?;
                let Some(file) = files.iter().find(|f| f.path == rel) else {
                    return if cookbook_children(&files, &rel).is_some() {
                        Err(StoreError::not_allowed(path, "is a directory"))
                    } else {
                        Err(StoreError::not_found(path))
                    };
                };
                let response = self.send(Method::GET, &file.url, None, path)?;
                return Ok(response.bytes()?.to_vec());
            }
            _ => return Err(StoreError::not_allowed(path, "is a directory")),
        };
        let mut pretty = serde_json::to_vec_pretty(&value)
            .map_err(|e| StoreError::not_allowed(path, format!("cannot be rendered as JSON: {e}")))?;
        pretty.push(b'\n');
        Ok(pretty)
    }

    fn write(&self, path: &EntryPath, content: &[u8]) -> Result<()> {
        let resource = Resource::parse(path).ok_or_else(|| StoreError::not_allowed(path, "cannot be created on the server"))?;
        match resource {
            Resource::Object { endpoint, name } => {
                self.put_or_post(&format!("{endpoint}/{name}"), endpoint, content, path)
            }
            Resource::DataBagItem { bag, item } => {
                self.put_or_post(&format!("data/{bag}/{item}"), &format!("data/{bag}"), content, path)
            }
            Resource::Cookbook { .. } => Err(StoreError::not_allowed(
                path,
                "cannot be uploaded file by file; cookbooks are read only",
            )),
            _ => Err(StoreError::not_allowed(path, "is a directory")),
        }
    }

    fn mkdir(&self, path: &EntryPath) -> Result<()> {
        let resource = Resource::parse(path).ok_or_else(|| StoreError::not_allowed(path, "cannot be created on the server"))?;
        match resource {
            Resource::Root | Resource::Collection { .. } => Ok(()),
            Resource::DataBag { bag } => {
                let body = serde_json::json!({ "name": bag });
                match self.send(Method::POST, &self.url("data"), Some(&body), path) {
                    Ok(_) | Err(StoreError::Conflict { .. }) => Ok(()),
                    Err(e) => Err(e),
                }
            }
            _ => Err(StoreError::not_allowed(path, "cannot be created as a directory")),
        }
    }

    fn delete(&self, path: &EntryPath, recursive: bool) -> Result<()> {
        let resource = Resource::parse(path).ok_or_else(|| StoreError::not_found(path))?;
        let endpoint = match resource {
            Resource::Object { endpoint, name } => format!("{endpoint}/{name}"),
            Resource::DataBagItem { bag, item } => format!("data/{bag}/{item}"),
            Resource::DataBag { bag } => {
                if !recursive && !self.list(path)?.is_empty() {
                    return Err(StoreError::MustDeleteRecursively {
                        path: path.to_string(),
                    });
                }
                format!("data/{bag}")
            }
            Resource::Cookbook { .. } => {
                return Err(StoreError::not_allowed(path, "cannot be deleted; cookbooks are read only"));
            }
            Resource::Root | Resource::Collection { .. } => {
                return Err(StoreError::not_allowed(path, "cannot be deleted"));
            }
        };
        self.send(Method::DELETE, &self.url(&endpoint), None, path)?;
        Ok(())
    }
}

fn http_error(path: &EntryPath, response: Response) -> StoreError {
    StoreError::Http {
        path: path.to_string(),
        status: response.status().as_u16(),
        body: response.text().unwrap_or_default(),
    }
}

/// Flatten a cookbook version manifest into `(relative path, url)` pairs.
fn manifest_files(manifest: &Value) -> Vec<CookbookFile> {
    let Some(object) = manifest.as_object() else {
        return Vec::new();
    };
    let mut files: BTreeMap<String, CookbookFile> = BTreeMap::new();
    for segment in object.values().filter_map(Value::as_array) {
        for file in segment {
            let path = file.get("path").and_then(Value::as_str);
            let url = file.get("url").and_then(Value::as_str);
            if let (Some(path), Some(url)) = (path, url) {
                files.insert(
                    path.to_string(),
                    CookbookFile {
                        path: path.to_string(),
                        url: url.to_string(),
                    },
                );
            }
        }
    }
    files.into_values().collect()
}

/// Children of directory `rel` inside a cookbook, or `None` when nothing
/// lives under it.
fn cookbook_children(files: &[CookbookFile], rel: &str) -> Option<Vec<RemoteChild>> {
    let mut children: BTreeMap<&str, bool> = BTreeMap::new();
    for file in files {
        let rest = if rel.is_empty() {
            file.path.as_str()
        } else {
            match file.path.strip_prefix(rel).and_then(|r| r.strip_prefix('/')) {
                Some(rest) => rest,
                None => continue,
            }
        };
        match rest.split_once('/') {
            Some((dir, _)) => {
                children.insert(dir, true);
            }
            None => {
                children.entry(rest).or_insert(false);
            }
        }
    }
    if children.is_empty() {
        return None;
    }
    Some(
        children
            .into_iter()
            .map(|(name, is_dir)| RemoteChild {
                name: name.to_string(),
                is_dir,
            })
            .collect(),
    )
}
