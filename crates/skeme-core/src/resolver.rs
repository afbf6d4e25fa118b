//! The `$ref` resolution engine
//!
//! Walks a value tree and replaces every reference object with the value it
//! points to, loading referenced documents through a [`DocumentLoader`].
//! Sibling array elements and object properties are resolved concurrently;
//! each single reference is resolved strictly in order: cycle check, load,
//! fragment lookup, then recursion into the substituted value under the
//! referenced document's context. When references are kept, the node's own
//! siblings are resolved under the referencing document's context and merged
//! with the fully resolved target last.
//!
//! Copyright (c) 2025 Skeme Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::loader::{canonical_url, Document, DocumentCache, DocumentDecoder, DocumentLoader};
use crate::options::ResolveOptions;
use crate::pointer::get_nested_value;
use futures::future::{try_join_all, BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, instrument, trace};
use url::Url;

/// Property that marks a reference object
pub const REF_KEY: &str = "$ref";

/// Property holding the original `$ref` string when references are kept
pub const KEEP_REFS_MARKER: &str = "x-skeme-ref";

/// Where the walker currently is: the document being scanned and the
/// documents entered on the way there.
///
/// Each branch of the walk owns its context. Entering a reference returns
/// an extended copy, so sibling branches never see each other's chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionContext {
    /// Absolute URL of the document being scanned
    pub base_url: Url,
    /// Canonical URLs entered on the current path, outermost first
    pub resolve_chain: Vec<String>,
}

impl ResolutionContext {
    /// Context for scanning `base_url` with nothing entered yet
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            resolve_chain: Vec::new(),
        }
    }

    /// Enter the document behind `target`.
    ///
    /// Fails with [`Error::CycleDetected`] if its canonical URL is already on
    /// the chain. Fragments are ignored, so two different fragments of one
    /// document on the same path count as a cycle.
    pub fn enter(&self, target: &Url) -> Result<Self> {
        let canonical = canonical_url(target);
        if self.resolve_chain.contains(&canonical) {
            return Err(Error::cycle_detected(canonical, &self.resolve_chain));
        }

        let mut base_url = target.clone();
        base_url.set_fragment(None);
        let mut resolve_chain = self.resolve_chain.clone();
        resolve_chain.push(canonical);

        Ok(Self {
            base_url,
            resolve_chain,
        })
    }

    /// Number of documents entered on this path
    pub fn depth(&self) -> usize {
        self.resolve_chain.len()
    }
}

/// Structural classification of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape<'a> {
    /// String, number, boolean or null
    Scalar,
    Sequence,
    /// Object that is not a reference
    Mapping,
    /// Object with a string `$ref`
    Reference(&'a str),
}

impl<'a> NodeShape<'a> {
    /// Classify `value`. An object whose `$ref` is not a string is a plain
    /// mapping, unless `strict_refs` is set, in which case it is rejected.
    pub fn classify(value: &'a Value, strict_refs: bool, document: &Url) -> Result<Self> {
        match value {
            Value::Array(_) => Ok(NodeShape::Sequence),
            Value::Object(map) => match map.get(REF_KEY) {
                Some(Value::String(target)) => Ok(NodeShape::Reference(target)),
                Some(other) if strict_refs => Err(Error::unknown_value_shape(
                    document.as_str(),
                    format!("`{}` holding {}", REF_KEY, describe(other)),
                )),
                _ => Ok(NodeShape::Mapping),
            },
            _ => Ok(NodeShape::Scalar),
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Merge a reference node with the object it resolved to: the node's own
/// properties minus `$ref`, overlaid by the target's, plus the provenance
/// marker. The marker always names `reference`, replacing any marker the
/// target picked up from references of its own. Non-object targets are
/// returned as they are.
pub fn merge_kept_reference(mut node: Map<String, Value>, resolved: Value, reference: &str) -> Value {
    match resolved {
        Value::Object(target) => {
            node.remove(REF_KEY);
            node.extend(target);
            node.insert(KEEP_REFS_MARKER.to_string(), Value::String(reference.to_string()));
            Value::Object(node)
        }
        other => other,
    }
}

/// One resolution session: a loader, its cache and the walk settings
#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    loader: DocumentLoader,
    base_url: Option<Url>,
    keep_refs: bool,
    strict_refs: bool,
}

impl ReferenceResolver {
    pub fn new(options: ResolveOptions) -> Self {
        let cache = options.cache.then(|| {
            options
                .shared_cache
                .clone()
                .unwrap_or_else(|| Arc::new(DocumentCache::new()))
        });
        let loader = DocumentLoader::new(
            options.transport,
            DocumentDecoder::new(options.yaml),
            cache,
            &options.fetch_options,
        );

        Self {
            loader,
            base_url: options.base_url,
            keep_refs: options.keep_refs,
            strict_refs: options.strict_refs,
        }
    }

    pub fn loader(&self) -> &DocumentLoader {
        &self.loader
    }

    /// Cache used by this session, if caching is enabled
    pub fn cache(&self) -> Option<&Arc<DocumentCache>> {
        self.loader.cache()
    }

    /// Turn the caller's input into an absolute URL
    pub fn root_url(&self, path_or_url: &str) -> Result<Url> {
        match Url::parse(path_or_url) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base
                    .join(path_or_url)
                    .map_err(|e| Error::invalid_url(path_or_url, Some(base), e)),
                None => Err(Error::configuration(format!(
                    "relative input '{}' needs a base URL",
                    path_or_url
                ))),
            },
            Err(e) => Err(Error::invalid_url(path_or_url, None, e)),
        }
    }

    /// Load `path_or_url` and resolve every reference reachable from it.
    ///
    /// A fragment on the input selects the part of the document to return.
    #[instrument(skip(self), fields(keep_refs = self.keep_refs))]
    pub async fn resolve(&self, path_or_url: &str) -> Result<Value> {
        let url = self.root_url(path_or_url)?;
        let context = ResolutionContext::new(url.clone()).enter(&url)?;

        let document = self.loader.load(&url).await?;
        let root = select(&document, &url)?;

        let resolved = self.resolve_node(root, context).await?;
        debug!(url = %url, "Resolved document");
        Ok(resolved)
    }

    /// Resolve references inside an already decoded document that lives at
    /// `base_url`. The document itself is not fetched.
    pub async fn resolve_value(&self, document: Value, base_url: Url) -> Result<Value> {
        let context = ResolutionContext::new(base_url.clone()).enter(&base_url)?;
        self.resolve_node(document, context).await
    }

    /// Resolve one node under `context`
    pub fn resolve_node<'a>(&'a self, value: Value, context: ResolutionContext) -> BoxFuture<'a, Result<Value>> {
        async move {
            let target = match NodeShape::classify(&value, self.strict_refs, &context.base_url)? {
                NodeShape::Reference(target) => Some(target.to_owned()),
                NodeShape::Scalar | NodeShape::Sequence | NodeShape::Mapping => None,
            };

            match (value, target) {
                (Value::Object(node), Some(target)) => {
                    let (data, next) = self.follow_reference(&target, &context).await?;
                    let resolved = self.resolve_node(data, next).await?;
                    if !self.keep_refs || !resolved.is_object() {
                        return Ok(resolved);
                    }

                    // Siblings belong to the referencing document
                    let mut siblings = node;
                    siblings.remove(REF_KEY);
                    let siblings = self.resolve_properties(siblings, &context).await?;
                    Ok(merge_kept_reference(siblings, resolved, &target))
                }
                (Value::Object(map), None) => Ok(Value::Object(self.resolve_properties(map, &context).await?)),
                (Value::Array(items), _) => {
                    let items =
                        try_join_all(items.into_iter().map(|item| self.resolve_node(item, context.clone())))
                            .await?;
                    Ok(Value::Array(items))
                }
                (scalar, _) => Ok(scalar),
            }
        }
        .boxed()
    }

    /// Resolve every property of `map` concurrently under `context`
    async fn resolve_properties(
        &self,
        map: Map<String, Value>,
        context: &ResolutionContext,
    ) -> Result<Map<String, Value>> {
        let properties = try_join_all(map.into_iter().map(|(key, value)| {
            let context = context.clone();
            async move { Ok::<_, Error>((key, self.resolve_node(value, context).await?)) }
        }))
        .await?;
        Ok(properties.into_iter().collect())
    }

    /// Load what `target` points to and return it with the context to
    /// resolve it under
    async fn follow_reference(&self, target: &str, context: &ResolutionContext) -> Result<(Value, ResolutionContext)> {
        let url = context
            .base_url
            .join(target)
            .map_err(|e| Error::invalid_url(target, Some(&context.base_url), e))?;
        let next = context.enter(&url)?;

        trace!(reference = %target, url = %url, depth = next.depth(), "Following reference");
        let document = self.loader.load(&url).await?;
        let data = select(&document, &url)?;
        Ok((data, next))
    }
}

/// Copy out the part of `document` addressed by the fragment of `url`
fn select(document: &Document, url: &Url) -> Result<Value> {
    match url.fragment() {
        Some(fragment) if !fragment.is_empty() => {
            get_nested_value(document, &format!("#{}", fragment)).cloned()
        }
        _ => Ok(Value::clone(document)),
    }
}
