//! Market — a closed prediction contract from the provider catalog.

use super::lenient;
use serde::{Deserialize, Serialize};

/// One outcome side of a market (`side_a`, `side_b`, `winning_side`).
///
/// The provider usually sends `{"id": "...", "label": "Yes"}`, but some
/// payloads carry the bare label string; both decode to the same value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SideRepr")]
pub struct Side {
    pub id: Option<String>,
    pub label: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SideRepr {
    Label(String),
    Full {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        label: Option<String>,
    },
}

impl From<SideRepr> for Side {
    fn from(repr: SideRepr) -> Self {
        match repr {
            SideRepr::Label(label) => Side {
                id: None,
                label: Some(label),
            },
            SideRepr::Full { id, label } => Side { id, label },
        }
    }
}

impl Side {
    pub fn labeled(label: &str) -> Self {
        Self {
            id: None,
            label: Some(label.to_string()),
        }
    }
}

/// Market record as served by the provider's catalog endpoint.
///
/// Only the attributes the pipeline consumes are modeled; everything else in
/// the payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub condition_id: String,
    pub market_slug: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub winning_side: Option<Side>,
    #[serde(default)]
    pub side_a: Option<Side>,
    #[serde(default)]
    pub side_b: Option<Side>,
    /// Resolution time, unix seconds.
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub end_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub group_item_title: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub total_volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub liquidity: Option<f64>,
}

/// Why a market was rejected by the yes/no filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligible {
    /// Market has not resolved (no `winning_side`).
    NoWinningSide,
    /// `side_a` or `side_b` (or its label) is absent.
    MissingOutcomeLabels,
    /// Labels are present but are not the pair {yes, no}.
    NotYesNo,
}

/// Accessors tried in order for `market_category`.
pub const CATEGORY_FIELDS: [fn(&Market) -> Option<String>; 2] = [category_field, group_title_field];

/// Accessors tried in order for `market_volume_total`.
pub const VOLUME_FIELDS: [fn(&Market) -> Option<f64>; 2] = [volume_field, total_volume_field];

fn category_field(m: &Market) -> Option<String> {
    non_blank(m.category.as_deref())
}

fn group_title_field(m: &Market) -> Option<String> {
    non_blank(m.group_item_title.as_deref())
}

fn volume_field(m: &Market) -> Option<f64> {
    m.volume
}

fn total_volume_field(m: &Market) -> Option<f64> {
    m.total_volume
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty()).map(str::to_string)
}

/// Return the first accessor result that is present.
pub fn first_present<T, R>(item: &T, accessors: &[fn(&T) -> Option<R>]) -> Option<R> {
    accessors.iter().find_map(|field| field(item))
}

impl Market {
    /// Apply the yes/no filter.
    ///
    /// Eligible iff a winning side is present and the two outcome labels,
    /// lower-cased, are `{"yes", "no"}` in either order.
    pub fn check_eligibility(&self) -> Result<(), Ineligible> {
        if self.winning_side.is_none() {
            return Err(Ineligible::NoWinningSide);
        }
        fn label(side: &Option<Side>) -> Option<&str> {
            side.as_ref().and_then(|s| s.label.as_deref())
        }
        let (Some(a), Some(b)) = (label(&self.side_a), label(&self.side_b)) else {
            return Err(Ineligible::MissingOutcomeLabels);
        };
        match (a.to_lowercase().as_str(), b.to_lowercase().as_str()) {
            ("yes", "no") | ("no", "yes") => Ok(()),
            _ => Err(Ineligible::NotYesNo),
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.check_eligibility().is_ok()
    }

    /// True when the winning side's label (trimmed, lower-cased) is "yes".
    pub fn resolved_yes(&self) -> bool {
        self.winning_side
            .as_ref()
            .and_then(|s| s.label.as_deref())
            .map(|l| l.trim().eq_ignore_ascii_case("yes"))
            .unwrap_or(false)
    }

    /// `category`, falling back to `group_item_title`.
    pub fn category_label(&self) -> Option<String> {
        first_present(self, &CATEGORY_FIELDS)
    }

    /// `volume`, falling back to `total_volume`.
    pub fn volume_total(&self) -> Option<f64> {
        first_present(self, &VOLUME_FIELDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(winner: Option<&str>, a: Option<&str>, b: Option<&str>) -> Market {
        Market {
            condition_id: "0xabc".into(),
            market_slug: "will-it-rain".into(),
            winning_side: winner.map(Side::labeled),
            side_a: a.map(Side::labeled),
            side_b: b.map(Side::labeled),
            end_time: Some(1_700_000_000),
            ..Default::default()
        }
    }

    #[test]
    fn yes_no_in_either_order_is_eligible() {
        assert!(market(Some("Yes"), Some("Yes"), Some("No")).is_eligible());
        assert!(market(Some("No"), Some("NO"), Some("yes")).is_eligible());
    }

    #[test]
    fn unresolved_market_is_rejected() {
        assert_eq!(
            market(None, Some("Yes"), Some("No")).check_eligibility(),
            Err(Ineligible::NoWinningSide)
        );
    }

    #[test]
    fn missing_side_is_rejected() {
        assert_eq!(
            market(Some("Yes"), Some("Yes"), None).check_eligibility(),
            Err(Ineligible::MissingOutcomeLabels)
        );
        let mut m = market(Some("Yes"), Some("Yes"), Some("No"));
        m.side_b = Some(Side::default());
        assert_eq!(m.check_eligibility(), Err(Ineligible::MissingOutcomeLabels));
    }

    #[test]
    fn non_binary_labels_are_rejected() {
        assert_eq!(
            market(Some("Up"), Some("Up"), Some("Down")).check_eligibility(),
            Err(Ineligible::NotYesNo)
        );
        assert_eq!(
            market(Some("Yes"), Some("Yes"), Some("Yes")).check_eligibility(),
            Err(Ineligible::NotYesNo)
        );
    }

    #[test]
    fn resolved_yes_trims_and_ignores_case() {
        assert!(market(Some("  YES "), Some("Yes"), Some("No")).resolved_yes());
        assert!(!market(Some("No"), Some("Yes"), Some("No")).resolved_yes());
        let mut m = market(Some("Yes"), Some("Yes"), Some("No"));
        m.winning_side = Some(Side::default());
        assert!(!m.resolved_yes());
    }

    #[test]
    fn category_falls_back_to_group_title() {
        let mut m = market(Some("Yes"), Some("Yes"), Some("No"));
        assert_eq!(m.category_label(), None);
        m.group_item_title = Some("Elections".into());
        assert_eq!(m.category_label().as_deref(), Some("Elections"));
        m.category = Some("  ".into());
        assert_eq!(m.category_label().as_deref(), Some("Elections"));
        m.category = Some("Politics".into());
        assert_eq!(m.category_label().as_deref(), Some("Politics"));
    }

    #[test]
    fn volume_falls_back_to_total_volume() {
        let mut m = market(Some("Yes"), Some("Yes"), Some("No"));
        m.total_volume = Some(1200.0);
        assert_eq!(m.volume_total(), Some(1200.0));
        m.volume = Some(0.0);
        assert_eq!(m.volume_total(), Some(0.0));
    }

    #[test]
    fn decodes_provider_payload() {
        let json = r#"{
            "condition_id": "0xdeadbeef",
            "market_slug": "fed-cut-in-march",
            "title": "Fed cut in March?",
            "start_time": "1700000000",
            "end_time": 1707000000,
            "volume": "15234.5",
            "liquidity": null,
            "side_a": {"id": "111", "label": "Yes"},
            "side_b": {"id": "222", "label": "No"},
            "winning_side": "No",
            "tags": ["economy"]
        }"#;
        let m: Market = serde_json::from_str(json).unwrap();
        assert_eq!(m.start_time, Some(1_700_000_000));
        assert_eq!(m.end_time, Some(1_707_000_000));
        assert_eq!(m.volume, Some(15234.5));
        assert_eq!(m.liquidity, None);
        assert_eq!(m.winning_side, Some(Side::labeled("No")));
        assert!(m.is_eligible());
        assert!(!m.resolved_yes());
    }
}
