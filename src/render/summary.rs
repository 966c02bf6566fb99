use chrono::{DateTime, Utc};

use super::escape_html;
use crate::status::{pass_rate, StatusSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardClass {
    Success,
    Warning,
    Error,
}

impl CardClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    fn for_pass_rate(rate: f64) -> Self {
        if rate >= 95.0 {
            Self::Success
        } else if rate >= 80.0 {
            Self::Warning
        } else {
            Self::Error
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryCard {
    pub title: &'static str,
    pub value: String,
    pub label: String,
    pub class: CardClass,
}

impl SummaryCard {
    pub fn to_html(&self) -> String {
        format!(
            r#"<div class="summary-card {}"><h3>{}</h3><div class="metric">{}</div><div class="label">{}</div></div>"#,
            self.class.as_str(),
            escape_html(self.title),
            escape_html(&self.value),
            escape_html(&self.label)
        )
    }
}

pub fn summarize(snapshot: &StatusSnapshot, now: DateTime<Utc>) -> Vec<SummaryCard> {
    let (passed, total) = snapshot
        .systems
        .values()
        .fold((0_u64, 0_u64), |(passed, total), result| {
            (
                passed.saturating_add(result.passed),
                total.saturating_add(result.total),
            )
        });

    // Rounded first so the class agrees with the displayed figure.
    let overall = (pass_rate(passed, total) * 10.0).round() / 10.0;

    vec![
        SummaryCard {
            title: "Total ZKVMs",
            value: snapshot.systems.len().to_string(),
            label: "implementations tested".to_string(),
            class: CardClass::Success,
        },
        SummaryCard {
            title: "Overall Pass Rate",
            value: format!("{overall:.1}%"),
            label: format!("{passed}/{total} tests passed"),
            class: CardClass::for_pass_rate(overall),
        },
        SummaryCard {
            title: "Last Test Run",
            value: time_since(snapshot.last_updated, now),
            label: "time since last update".to_string(),
            class: CardClass::Success,
        },
    ]
}

pub fn time_since(last_updated: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(last_updated) = last_updated else {
        return "Never".to_string();
    };

    let elapsed = now.signed_duration_since(last_updated);
    let hours = elapsed.num_hours();
    let minutes = elapsed.num_minutes() % 60;

    if hours > 24 {
        format!("{}d ago", hours / 24)
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{}m ago", minutes.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_summary_for_demo_snapshot() {
        let now = Utc::now();
        let cards = summarize(&StatusSnapshot::demo(now), now);

        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].value, "3");
        assert_eq!(cards[1].value, "97.2%");
        assert_eq!(cards[1].label, "137/141 tests passed");
        assert_eq!(cards[1].class, CardClass::Success);
        assert_eq!(cards[2].value, "0m ago");
    }

    #[test]
    fn test_summary_for_empty_snapshot() {
        let cards = summarize(&StatusSnapshot::empty(), Utc::now());

        assert_eq!(cards[0].value, "0");
        assert_eq!(cards[1].value, "0.0%");
        assert_eq!(cards[1].class, CardClass::Error);
        assert_eq!(cards[2].value, "Never");
    }

    #[test]
    fn test_pass_rate_classes() {
        assert_eq!(CardClass::for_pass_rate(100.0), CardClass::Success);
        assert_eq!(CardClass::for_pass_rate(95.0), CardClass::Success);
        assert_eq!(CardClass::for_pass_rate(94.9), CardClass::Warning);
        assert_eq!(CardClass::for_pass_rate(80.0), CardClass::Warning);
        assert_eq!(CardClass::for_pass_rate(79.9), CardClass::Error);
    }

    #[test]
    fn test_time_since() {
        let now = Utc::now();

        assert_eq!(time_since(Some(now - Duration::minutes(12)), now), "12m ago");
        assert_eq!(
            time_since(Some(now - Duration::minutes(3 * 60 + 5)), now),
            "3h 5m"
        );
        assert_eq!(time_since(Some(now - Duration::hours(24)), now), "24h 0m");
        assert_eq!(time_since(Some(now - Duration::hours(50)), now), "2d ago");
        assert_eq!(time_since(Some(now + Duration::minutes(5)), now), "0m ago");
    }

    #[test]
    fn test_card_html_escapes() {
        let card = SummaryCard {
            title: "T",
            value: "<1>".to_string(),
            label: "a & b".to_string(),
            class: CardClass::Warning,
        };
        let html = card.to_html();

        assert!(html.contains("summary-card warning"));
        assert!(html.contains("&lt;1&gt;"));
        assert!(html.contains("a &amp; b"));
    }
}
