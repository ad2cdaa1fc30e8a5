//! Multi-domain key/value metadata of a band.
//!
//! Domains and items keep insertion order so serialized trees are stable.
//! The default domain is the empty string.

use crate::tree::XmlNode;
use crate::FastIndexMap;

/// Ordered metadata items grouped by domain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetadataDomains {
    domains: FastIndexMap<String, FastIndexMap<String, String>>,
}

impl MetadataDomains {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items of `domain` in insertion order.
    pub fn items<'a>(&'a self, domain: &str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.domains
            .get(domain)
            .into_iter()
            .flat_map(|d| d.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub fn item(&self, key: &str, domain: &str) -> Option<&str> {
        self.domains.get(domain)?.get(key).map(String::as_str)
    }

    /// Number of items in `domain`.
    pub fn item_count(&self, domain: &str) -> usize {
        self.domains.get(domain).map_or(0, |d| d.len())
    }

    /// Sets or, with `None`, removes one item.
    pub fn set_item(&mut self, key: &str, value: Option<&str>, domain: &str) {
        match value {
            Some(v) => {
                self.domains
                    .entry(domain.to_string())
                    .or_default()
                    .insert(key.to_string(), v.to_string());
            }
            None => {
                if let Some(d) = self.domains.get_mut(domain) {
                    d.shift_remove(key);
                }
            }
        }
    }

    /// Replaces all items of `domain`.
    pub fn set_domain<K: AsRef<str>, V: AsRef<str>>(&mut self, items: &[(K, V)], domain: &str) {
        let d = self.domains.entry(domain.to_string()).or_default();
        d.clear();
        for (k, v) in items {
            d.insert(k.as_ref().to_string(), v.as_ref().to_string());
        }
    }

    pub fn domain_names(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.domains.values().all(|d| d.is_empty())
    }

    /// One `Metadata` element per non-empty domain.
    pub fn to_xml(&self) -> Vec<XmlNode> {
        let mut out = Vec::new();
        for (domain, items) in &self.domains {
            if items.is_empty() {
                continue;
            }
            let mut md = XmlNode::element("Metadata");
            if !domain.is_empty() {
                md.add_child(XmlNode::attribute("domain", domain.as_str()));
            }
            for (key, value) in items {
                let mut mdi = XmlNode::leaf("MDI", value.as_str());
                mdi.add_child(XmlNode::attribute("key", key.as_str()));
                md.add_child(mdi);
            }
            out.push(md);
        }
        out
    }

    /// Merges the `Metadata` children of `tree` into this dictionary.
    ///
    /// Items without a `key` attribute are skipped.
    pub fn merge_xml(&mut self, tree: &XmlNode) {
        for md in tree.elements_named("Metadata") {
            let domain = md.value_or("#domain", "");
            for mdi in md.elements_named("MDI") {
                let Some(key) = mdi.value_at("#key") else {
                    log::debug!("[pam] MDI without key in domain '{domain}' skipped");
                    continue;
                };
                self.set_item(key, Some(mdi.value_or("", "")), domain);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_remove_items() {
        let mut md = MetadataDomains::new();
        md.set_item("STATISTICS_MEAN", Some("1.5"), "");
        md.set_item("AREA_OR_POINT", Some("Area"), "");
        assert_eq!(md.item_count(""), 2);
        md.set_item("STATISTICS_MEAN", None, "");
        assert_eq!(md.item("STATISTICS_MEAN", ""), None);
        assert_eq!(md.item("AREA_OR_POINT", ""), Some("Area"));
    }

    #[test]
    fn set_domain_replaces() {
        let mut md = MetadataDomains::new();
        md.set_item("old", Some("x"), "IMAGERY");
        md.set_domain(&[("a", "1"), ("b", "2")], "IMAGERY");
        let items: Vec<_> = md.items("IMAGERY").collect();
        assert_eq!(items, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn xml_round_trip() {
        let mut md = MetadataDomains::new();
        md.set_item("k1", Some("v1"), "");
        md.set_item("k2", Some("a<b"), "custom");
        let nodes = md.to_xml();
        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].value_at("#domain").is_none());
        assert_eq!(nodes[1].value_at("#domain"), Some("custom"));

        let mut root = XmlNode::element("PAMRasterBand");
        for n in nodes {
            root.add_child(n);
        }
        let mut back = MetadataDomains::new();
        back.merge_xml(&root);
        assert_eq!(back, md);
    }

    #[test]
    fn empty_domains_not_serialized() {
        let mut md = MetadataDomains::new();
        md.set_domain::<&str, &str>(&[], "empty");
        assert!(md.is_empty());
        assert!(md.to_xml().is_empty());
    }
}
