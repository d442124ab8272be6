//! Naming-convention heuristics.
//!
//! Pure functions over plain strings. Nothing here touches the schema
//! catalog, so every rule can be tested in isolation.

use autorel_core::Inflector;
use regex::Regex;

/// The stem of a foreign-key column (`author_id` -> `author`).
///
/// Matching is case-sensitive and needs a non-empty stem, so `id` and `_id`
/// are not foreign keys.
pub fn foreign_key_stem(column: &str) -> Option<&str> {
    column.strip_suffix("_id").filter(|stem| !stem.is_empty())
}

/// Strip `<package>_` from a table name, if the table belongs to the package.
pub fn strip_package_prefix<'a>(table: &'a str, package: &str) -> Option<&'a str> {
    table
        .strip_prefix(package)
        .and_then(|rest| rest.strip_prefix('_'))
        .filter(|rest| !rest.is_empty())
}

/// Classification of a sibling table relative to the source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableShape {
    /// `<singular>_...`: rows of the sibling belong to one source row.
    OneToMany,
    /// `<plural>_...` or `..._<plural>`: the sibling joins the source to a target.
    ManyToMany,
    /// No naming pattern matched.
    Unmatched,
}

/// Name patterns derived from one source table's local name.
#[derive(Debug, Clone)]
pub struct NamePatterns {
    singular: String,
    plural: String,
    one_many: Regex,
    many_prefix: Regex,
    many_suffix: Regex,
}

impl NamePatterns {
    /// Build the patterns for a source table named `source_name`.
    pub fn new(source_name: &str, inflector: &dyn Inflector) -> Result<Self, regex::Error> {
        let singular = inflector.singularize(source_name);
        let plural = inflector.pluralize(source_name);
        Ok(Self {
            one_many: Regex::new(&format!("^{}_", regex::escape(&singular)))?,
            many_prefix: Regex::new(&format!("^{}_", regex::escape(&plural)))?,
            many_suffix: Regex::new(&format!("_{}$", regex::escape(&plural)))?,
            singular,
            plural,
        })
    }

    /// Singular form of the source name.
    pub fn singular(&self) -> &str {
        &self.singular
    }

    /// Plural form of the source name.
    pub fn plural(&self) -> &str {
        &self.plural
    }

    /// Classify a package-stripped sibling table name by its shape alone.
    pub fn classify(&self, remainder: &str) -> TableShape {
        if self.one_many.is_match(remainder) {
            TableShape::OneToMany
        } else if self.many_prefix.is_match(remainder) || self.many_suffix.is_match(remainder) {
            TableShape::ManyToMany
        } else {
            TableShape::Unmatched
        }
    }

    /// Association name for a one-to-many sibling (`user_groups` -> `groups`).
    pub fn one_to_many_name(&self, remainder: &str) -> String {
        self.one_many.replace(remainder, "").into_owned()
    }

    /// Association name for a many-to-many sibling
    /// (`posts_categories` -> `categories`).
    ///
    /// A suffix-only match (`tags_posts`) keeps the remainder unchanged.
    pub fn many_to_many_name(&self, remainder: &str) -> String {
        self.many_prefix.replace(remainder, "").into_owned()
    }
}

/// Classify a sibling that matched no naming pattern but passed the
/// primary-key containment probe.
///
/// A single-segment name is one-to-many. A multi-segment name is
/// one-to-many if any segment is a singular noun, many-to-many otherwise.
pub fn classify_by_segments(remainder: &str, inflector: &dyn Inflector) -> TableShape {
    let segments: Vec<&str> = remainder.split('_').collect();
    if segments.len() == 1 || segments.iter().any(|segment| inflector.is_singular(segment)) {
        TableShape::OneToMany
    } else {
        TableShape::ManyToMany
    }
}

/// Name under which a one-to-one association on `<stem>_id` is registered,
/// together with the pluralized table-name guess.
pub fn one_to_one_names(stem: &str, inflector: &dyn Inflector) -> (String, String) {
    let plural = inflector.pluralize(stem);
    (inflector.singularize(&plural), plural)
}
