//! Query filter construction: translates a logical file query into the
//! predicate list consumed by [`MetadataStore::query`](crate::MetadataStore::query).

use serde::{Deserialize, Serialize};

use crate::types::{FileKind, ShelfCtx};

/// One filter predicate. Predicates in a [`FilterSpec`] are ANDed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// The access predicate: the caller owns the record or the record has
    /// been shared with the caller's email. Every spec built through
    /// [`FileQuery`] carries exactly one of these - it is the sole
    /// authorization boundary for reads.
    OwnedByOrSharedWith { owner_id: String, email: String },

    /// Narrowing predicate: the record's owner is exactly this user.
    /// Used by the usage path so shared files never count against the
    /// recipient's capacity.
    OwnerIs(String),

    /// The record's kind is one of these
    KindIn(Vec<FileKind>),

    /// The record's name contains this substring. Case sensitivity is
    /// delegated to the underlying store.
    NameContains(String),
}

/// Field a result set can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    Name,
    Size,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "name" => Some(Self::Name),
            "size" => Some(Self::Size),
            "created_at" | "createdAt" => Some(Self::CreatedAt),
            "updated_at" | "updatedAt" => Some(Self::UpdatedAt),
            _ => None,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Parsed sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    /// Newest first
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Descending,
        }
    }
}

impl SortSpec {
    /// Parse a `"<field>-<asc|desc>"` sort string, splitting on the last `-`.
    ///
    /// Parsing is total so a caller-supplied string can never fail a list
    /// call: an unknown field falls back to `created_at`, and any direction
    /// other than `asc` falls back to descending. The direction fallback is
    /// inherited behavior, kept deliberately - see DESIGN.md.
    pub fn parse(raw: &str) -> Self {
        let Some((field_raw, direction_raw)) = raw.rsplit_once('-') else {
            return Self::default();
        };
        let field = SortField::parse(field_raw).unwrap_or(SortField::CreatedAt);
        let direction = if direction_raw == "asc" {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        };
        Self { field, direction }
    }
}

/// The filter a metadata store consumes: ANDed predicates, a sort key, and
/// an optional result cap (absent means unbounded, subject to store
/// defaults).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub predicates: Vec<Predicate>,
    pub sort: SortSpec,
    pub limit: Option<usize>,
}

/// Builder for a scoped file listing.
///
/// `build` always seeds the owner-or-shared access predicate from the
/// caller's context before applying any narrowing options.
#[derive(Debug, Clone, Default)]
pub struct FileQuery {
    kinds: Vec<FileKind>,
    search: Option<String>,
    sort: Option<SortSpec>,
    limit: Option<usize>,
    owned_only: bool,
}

impl FileQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict results to these kinds
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = FileKind>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    /// Restrict results to names containing this substring
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Sort by a `"<field>-<asc|desc>"` string
    pub fn with_sort(mut self, sort: &str) -> Self {
        self.sort = Some(SortSpec::parse(sort));
        self
    }

    /// Cap the number of results
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Exclude records merely shared with the caller
    pub fn owned_only(mut self) -> Self {
        self.owned_only = true;
        self
    }

    /// Build the filter spec for `ctx`
    pub fn build(&self, ctx: &ShelfCtx) -> FilterSpec {
        let mut predicates = vec![Predicate::OwnedByOrSharedWith {
            owner_id: ctx.user_id.clone(),
            email: ctx.email.clone(),
        }];
        if self.owned_only {
            predicates.push(Predicate::OwnerIs(ctx.user_id.clone()));
        }
        if !self.kinds.is_empty() {
            predicates.push(Predicate::KindIn(self.kinds.clone()));
        }
        if let Some(search) = self.search.as_deref() {
            if !search.is_empty() {
                predicates.push(Predicate::NameContains(search.to_string()));
            }
        }

        FilterSpec {
            predicates,
            sort: self.sort.unwrap_or_default(),
            limit: self.limit,
        }
    }
}
