//! Image references in the tenant's registry
//!
//! Mirrors the naming the build-request-processor uses when it deploys
//! images, including the tag length restriction imposed by OCI registries.

use crate::config::PlannerConfig;
use crate::model::ImageRegistry;
use tracing::debug;

/// Resolves fully qualified image references for one tenant registry.
#[derive(Debug, Clone)]
pub struct RegistryAddressResolver<'a> {
    registry: &'a ImageRegistry,
    config: &'a PlannerConfig,
}

impl<'a> RegistryAddressResolver<'a> {
    pub fn new(registry: &'a ImageRegistry, config: &'a PlannerConfig) -> Self {
        Self { registry, config }
    }

    /// `host[:port]/[owner/]repository`, with no tag.
    pub fn repository(&self) -> String {
        let mut reference = String::new();
        if self.registry.host.is_empty() {
            reference.push_str(&self.config.default_registry_host);
        } else {
            reference.push_str(&self.registry.host);
        }
        // The default port is never written; registry auth lookups do not
        // match references that carry it.
        if !self.registry.port.is_empty() && self.registry.port != self.config.default_tls_port {
            reference.push(':');
            reference.push_str(&self.registry.port);
        }
        reference.push('/');
        if !self.registry.owner.is_empty() {
            reference.push_str(&self.registry.owner);
            reference.push('/');
        }
        if self.registry.repository.is_empty() {
            reference.push_str(&self.config.default_registry_repository);
        } else {
            reference.push_str(&self.registry.repository);
        }
        reference
    }

    /// Repository reference plus a prefixed, length capped tag.
    pub fn image(&self, tag: &str) -> String {
        format!("{}:{}", self.repository(), self.tag(tag))
    }

    /// Repository reference, tagged only when a tag is given.
    pub fn reference(&self, tag: Option<&str>) -> String {
        match tag {
            Some(tag) if !tag.is_empty() => self.image(tag),
            _ => self.repository(),
        }
    }

    pub fn tag(&self, tag: &str) -> String {
        prepend_tag(tag, &self.registry.prepend_tag, self.config.max_tag_length)
    }
}

/// Applies `prefix_` to a tag and truncates the resulting tag to `max_len`.
///
/// When `image` already contains a colon only the part after the last colon is
/// treated as the tag. Overlong tags are cut, never rejected.
pub fn prepend_tag(image: &str, prefix: &str, max_len: usize) -> String {
    let (head, raw_tag) = match image.rfind(':') {
        Some(i) => (&image[..=i], &image[i + 1..]),
        None => ("", image),
    };
    let mut tag = if prefix.is_empty() {
        raw_tag.to_string()
    } else {
        format!("{}_{}", prefix, raw_tag)
    };
    if tag.len() > max_len {
        debug!(tag = %tag, max_len, "Truncating image tag");
        tag = truncate_to_boundary(&tag, max_len).to_string();
    }
    format!("{}{}", head, tag)
}

fn truncate_to_boundary(s: &str, max_len: usize) -> &str {
    let mut end = max_len.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
