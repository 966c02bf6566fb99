use super::{escape_html, file_stem};
use crate::status::{StatusSnapshot, SystemResult};

pub const NO_RESULTS: &str = "No results yet";
pub const UNKNOWN_ISA: &str = "Unknown";
pub const NO_COMMIT: &str = "N/A";
pub const DEFAULT_COMMIT_URL_BASE: &str = "https://github.com/codygunton";

const SHORT_COMMIT_LEN: usize = 8;
const COLUMNS: usize = 6;

// Known ISAs per zkVM, used when the status record doesn't declare one.
const ISA_LABELS: [(&str, &str); 7] = [
    ("airbender", "RV32IM"),
    ("jolt", "RV64IM"),
    ("openvm", "RV32IM"),
    ("pico", "RV32IM"),
    ("r0vm", "RV64IM"),
    ("sp1", "RV64IM"),
    ("zisk", "RV64IM"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeClass {
    Pass,
    Fail,
}

impl BadgeClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub text: String,
    pub class: BadgeClass,
}

impl Badge {
    pub fn for_result(result: &SystemResult) -> Self {
        let class = if result.failed == 0 {
            BadgeClass::Pass
        } else {
            BadgeClass::Fail
        };

        Self {
            text: format!("{}/{}", result.passed, result.total),
            class,
        }
    }

    pub fn to_html(&self) -> String {
        format!(
            r#"<span class="badge {}">{}</span>"#,
            self.class.as_str(),
            escape_html(&self.text)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitCell {
    pub short: String,
    pub href: Option<String>,
}

impl CommitCell {
    pub fn new(identifier: &str, commit: Option<&str>, commit_url_base: &str) -> Self {
        match commit {
            Some(commit) => Self {
                short: short_commit(commit),
                href: Some(commit_url(commit_url_base, identifier, commit)),
            },
            None => Self {
                short: NO_COMMIT.to_string(),
                href: None,
            },
        }
    }

    pub fn to_html(&self) -> String {
        let short = escape_html(&self.short);
        match &self.href {
            Some(href) => format!(
                r#"<a href="{}" target="_blank" rel="noopener"><code>{short}</code></a>"#,
                escape_html(href)
            ),
            None => format!("<code>{short}</code>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemRow {
    pub display_name: String,
    pub isa: String,
    pub commit: CommitCell,
    pub badge: Badge,
    pub detail_href: String,
    pub report_href: Option<String>,
    pub last_run: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableRow {
    System(SystemRow),
    Placeholder { message: String },
}

impl TableRow {
    pub fn to_html(&self) -> String {
        match self {
            Self::Placeholder { message } => format!(
                r#"<tr><td colspan="{COLUMNS}" class="empty">{}</td></tr>"#,
                escape_html(message)
            ),
            Self::System(row) => {
                let report = match &row.report_href {
                    Some(href) => format!(
                        r#"<a href="{}" class="btn btn-secondary">View</a>"#,
                        escape_html(href)
                    ),
                    None => r#"<span class="btn disabled">No Report</span>"#.to_string(),
                };

                format!(
                    concat!(
                        r#"<tr><td><a href="{}"><strong>{}</strong></a></td>"#,
                        "<td><code>{}</code></td><td>{}</td><td>{}</td><td>{}</td>",
                        "<td>{}</td></tr>"
                    ),
                    escape_html(&row.detail_href),
                    escape_html(&row.display_name),
                    escape_html(&row.isa),
                    row.commit.to_html(),
                    row.badge.to_html(),
                    escape_html(&row.last_run),
                    report
                )
            }
        }
    }
}

pub struct TableRenderer {
    commit_url_base: String,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_COMMIT_URL_BASE)
    }
}

impl TableRenderer {
    pub fn new(commit_url_base: impl Into<String>) -> Self {
        let commit_url_base = commit_url_base.into().trim_end_matches('/').to_string();
        Self { commit_url_base }
    }

    /// One row per system, or a single placeholder row when there are none.
    pub fn render(&self, snapshot: &StatusSnapshot) -> Vec<TableRow> {
        if snapshot.systems.is_empty() {
            return vec![TableRow::Placeholder {
                message: NO_RESULTS.to_string(),
            }];
        }

        snapshot
            .systems
            .iter()
            .map(|(id, result)| TableRow::System(self.render_row(id, result)))
            .collect()
    }

    pub fn render_row(&self, identifier: &str, result: &SystemResult) -> SystemRow {
        let report_href = match result.has_report {
            Some(false) => None,
            _ => Some(format!(
                "reports/{}-report.html",
                urlencoding::encode(identifier)
            )),
        };

        SystemRow {
            display_name: identifier.to_uppercase(),
            isa: isa_label(identifier, result.isa.as_deref()),
            commit: CommitCell::new(identifier, result.commit.as_deref(), &self.commit_url_base),
            badge: Badge::for_result(result),
            detail_href: detail_href(identifier),
            report_href,
            last_run: result
                .timestamp
                .map_or_else(|| "Never".to_string(), |ts| ts.format("%Y-%m-%d").to_string()),
        }
    }
}

pub fn isa_label(identifier: &str, declared: Option<&str>) -> String {
    if let Some(isa) = declared {
        return isa.trim().to_uppercase();
    }

    let key = identifier.to_lowercase();
    ISA_LABELS
        .iter()
        .find(|(id, _)| *id == key)
        .map_or(UNKNOWN_ISA, |(_, isa)| *isa)
        .to_string()
}

pub fn short_commit(commit: &str) -> String {
    commit.chars().take(SHORT_COMMIT_LEN).collect()
}

pub fn detail_href(identifier: &str) -> String {
    format!("zkvm/{}.html", file_stem(identifier))
}

fn commit_url(base: &str, identifier: &str, commit: &str) -> String {
    format!(
        "{base}/{}/commit/{}",
        urlencoding::encode(identifier),
        urlencoding::encode(commit)
    )
}
