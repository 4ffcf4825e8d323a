use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Role tags of the latest backend revision.
pub const ROLE_STUDENT: &str = "ROLE_STUDENT";
pub const ROLE_EMPLOYER: &str = "ROLE_EMPLOYER";
pub const ROLE_COMPANY_OWNER: &str = "ROLE_COMPANY_OWNER";

/// Role tags used by earlier backend revisions.
pub const ROLE_DEVELOPER: &str = "ROLE_DEVELOPER";
pub const ROLE_HR: &str = "ROLE_HR";
pub const ROLE_COMPANY: &str = "ROLE_COMPANY";

/// Home subtree of the company-owner role in the latest revision.
pub const COMPANY_PROFILE_PATH: &str = "/company-profile";

// Quoting/array wrappers deeper than this are treated as garbage.
const MAX_ROLE_NESTING: u8 = 4;

/// Role
///
/// A canonical, upper-case role tag such as `ROLE_STUDENT`. Only a
/// `RoleTaxonomy` hands out roles for stored strings, so a `Role` obtained from
/// normalisation is always one the taxonomy recognises.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Role(tag.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// PinnedRole
///
/// A role that may only navigate inside one path subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct PinnedRole {
    pub role: Role,
    pub home: String,
}

/// RoleTaxonomy
///
/// The set of role tags the client recognises, the aliases older payloads use
/// for them, and which roles are confined to a subtree of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleTaxonomy {
    recognized: BTreeSet<Role>,
    aliases: BTreeMap<String, Role>,
    pinned: Vec<PinnedRole>,
}

impl Default for RoleTaxonomy {
    fn default() -> Self {
        Self::latest()
    }
}

impl RoleTaxonomy {
    /// Student, employer and company owner; the company owner is confined to
    /// the company profile pages.
    pub fn latest() -> Self {
        Self::from_tags([ROLE_STUDENT, ROLE_EMPLOYER, ROLE_COMPANY_OWNER]).with_default_pins()
    }

    /// Student, developer, HR and company, with no pinned roles.
    pub fn legacy() -> Self {
        Self::from_tags([ROLE_STUDENT, ROLE_DEVELOPER, ROLE_HR, ROLE_COMPANY])
    }

    /// from_list
    ///
    /// Builds a taxonomy from a comma-separated list such as
    /// `ROLE_STUDENT, ROLE_EMPLOYER`. Pins are not implied; add them with
    /// `with_pin` or `with_pins_from_list`.
    pub fn from_list(list: &str) -> Self {
        Self::from_tags(list.split(',').map(str::trim).filter(|tag| !tag.is_empty()))
    }

    fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let recognized: BTreeSet<Role> = tags.into_iter().map(Role::new).collect();

        let mut aliases = BTreeMap::new();
        for role in &recognized {
            if let Some(bare) = role.as_str().strip_prefix("ROLE_") {
                aliases.insert(bare.to_string(), role.clone());
            }
        }

        // "HR" and "EMPLOYER" name the same class of user across revisions.
        let employer = [ROLE_EMPLOYER, ROLE_HR]
            .iter()
            .map(Role::new)
            .find(|role| recognized.contains(role));
        if let Some(employer) = employer {
            for alias in ["HR", "EMPLOYER"] {
                aliases.entry(alias.to_string()).or_insert_with(|| employer.clone());
            }
        }

        Self {
            recognized,
            aliases,
            pinned: Vec::new(),
        }
    }

    /// Pins the company owner to the company profile pages when this taxonomy
    /// recognises that role and has no pin for it yet.
    pub fn with_default_pins(self) -> Self {
        let owner = Role::new(ROLE_COMPANY_OWNER);
        if self.contains(&owner) && self.pinned_home(&owner).is_none() {
            self.with_pin(ROLE_COMPANY_OWNER, COMPANY_PROFILE_PATH)
        } else {
            self
        }
    }

    /// Confines `role` to the subtree rooted at `home`. A later pin for the
    /// same role replaces the earlier one.
    pub fn with_pin(mut self, role: &str, home: &str) -> Self {
        let role = Role::new(role);
        let home = normalize_home(home);
        self.pinned.retain(|pin| pin.role != role);
        self.pinned.push(PinnedRole { role, home });
        self
    }

    /// with_pins_from_list
    ///
    /// Replaces all pins with the `ROLE=/path` pairs of a comma-separated list.
    /// Malformed entries are skipped; an empty list removes every pin.
    pub fn with_pins_from_list(mut self, list: &str) -> Self {
        self.pinned.clear();
        for entry in list.split(',') {
            let Some((role, home)) = entry.split_once('=') else {
                continue;
            };
            if role.trim().is_empty() || home.trim().is_empty() {
                continue;
            }
            self = self.with_pin(role, home);
        }
        self
    }

    pub fn recognized(&self) -> impl Iterator<Item = &Role> {
        self.recognized.iter()
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.recognized.contains(role)
    }

    pub fn pinned(&self) -> &[PinnedRole] {
        &self.pinned
    }

    /// The home path `role` is confined to, if it is pinned.
    pub fn pinned_home(&self, role: &Role) -> Option<&str> {
        self.pinned
            .iter()
            .find(|pin| &pin.role == role)
            .map(|pin| pin.home.as_str())
    }

    /// The employer-class tag of this taxonomy (`ROLE_EMPLOYER` or `ROLE_HR`).
    pub fn employer(&self) -> Option<Role> {
        self.aliases.get("EMPLOYER").cloned()
    }

    /// The student tag of this taxonomy, if it has one.
    pub fn student(&self) -> Option<Role> {
        self.aliases.get("STUDENT").cloned()
    }

    /// normalize
    ///
    /// Turns a stored role string into a recognised role. Stored values come in
    /// several shapes depending on which page wrote them: plain
    /// (`ROLE_STUDENT`), quoted by a stray `JSON.stringify` (`"ROLE_STUDENT"`),
    /// or an array (`["ROLE_STUDENT"]`, only the first element counts).
    ///
    /// Anything unparseable or unrecognised yields `None`. Never panics.
    pub fn normalize(&self, raw: Option<&str>) -> Option<Role> {
        self.normalize_nested(raw?, 0)
    }

    fn normalize_nested(&self, raw: &str, depth: u8) -> Option<Role> {
        if depth > MAX_ROLE_NESTING {
            return None;
        }

        let value = raw.trim();
        if value.is_empty() {
            return None;
        }

        if let Some(inner) = strip_quotes(value) {
            // A JSON string literal may carry escaped content, decode it first.
            if value.starts_with('"') {
                if let Ok(decoded) = serde_json::from_str::<String>(value) {
                    return self.normalize_nested(&decoded, depth + 1);
                }
            }
            return self.normalize_nested(inner, depth + 1);
        }

        if value.starts_with('[') && value.ends_with(']') {
            let items: Vec<Value> = serde_json::from_str(value).ok()?;
            return match items.first()? {
                Value::String(first) => self.normalize_nested(first, depth + 1),
                _ => None,
            };
        }

        self.canonical(value)
    }

    fn canonical(&self, tag: &str) -> Option<Role> {
        let candidate = Role::new(tag);
        if self.recognized.contains(&candidate) {
            return Some(candidate);
        }
        self.aliases.get(candidate.as_str()).cloned()
    }
}

fn strip_quotes(value: &str) -> Option<&str> {
    if value.len() < 2 {
        return None;
    }
    ['"', '\''].into_iter().find_map(|quote| {
        value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    })
}

fn normalize_home(home: &str) -> String {
    let trimmed = home.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// is_employer_like
///
/// Loose check used by the user directory to hide employer accounts, whatever
/// revision of the role vocabulary the profile was written with.
pub fn is_employer_like(raw: &str) -> bool {
    let upper = raw.to_ascii_uppercase();
    ["EMPLOYER", "HR", "COMPANY", "RECRUITER"]
        .iter()
        .any(|marker| upper.contains(marker))
}
