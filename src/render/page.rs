use chrono::{DateTime, Utc};

use super::chart::ChartSpec;
use super::escape_html;
use super::summary::SummaryCard;
use super::table::{Badge, CommitCell, TableRow};
use crate::error::Result;
use crate::status::SystemResult;

const CHART_JS: &str = "https://cdn.jsdelivr.net/npm/chart.js@4";
const CHART_ADAPTER_JS: &str =
    "https://cdn.jsdelivr.net/npm/chartjs-adapter-date-fns@3/dist/chartjs-adapter-date-fns.bundle.min.js";

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:0;background:#f6f8fa;color:#24292f}\
.container{max-width:1100px;margin:0 auto;padding:24px}\
table{width:100%;border-collapse:collapse;background:#fff}\
th,td{padding:8px 12px;border-bottom:1px solid #d0d7de;text-align:left}\
.badge{padding:2px 8px;border-radius:10px;font-weight:600}\
.badge.pass{background:#dafbe1;color:#1a7f37}.badge.fail{background:#ffebe9;color:#cf222e}\
.summary{display:flex;gap:16px;margin:16px 0}\
.summary-card{flex:1;background:#fff;padding:16px;border-radius:6px;border-top:4px solid #1a7f37}\
.summary-card.warning{border-color:#9a6700}.summary-card.error{border-color:#cf222e}\
.chart{position:relative;height:360px;margin:24px 0}\
.empty{text-align:center;color:#57606a}";

pub fn last_updated_text(last_updated: Option<DateTime<Utc>>) -> String {
    match last_updated {
        Some(ts) => format!("Last updated: {}", ts.format("%Y-%m-%d %H:%M:%S UTC")),
        None => "Last updated: Never".to_string(),
    }
}

/// Everything the index page is built from.
pub struct IndexPage<'a> {
    pub last_updated: Option<DateTime<Utc>>,
    pub cards: &'a [SummaryCard],
    pub rows: &'a [TableRow],
    pub chart: &'a ChartSpec,
}

impl IndexPage<'_> {
    pub fn render(&self) -> Result<String> {
        let cards: String = self.cards.iter().map(SummaryCard::to_html).collect();
        let rows: String = self.rows.iter().map(TableRow::to_html).collect();
        let chart = embed_json(&self.chart.to_json(false)?);

        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>ZKVM Compliance Dashboard</title>
    <style>{STYLE}</style>
</head>
<body>
    <div class="container">
        <h1>ZKVM Compliance Dashboard</h1>
        <p id="last-updated">{last_updated}</p>
        <div id="summary-cards" class="summary">{cards}</div>
        <table>
            <thead>
                <tr><th>ZKVM</th><th>ISA</th><th>Commit</th><th>Results</th><th>Last Run</th><th>Report</th></tr>
            </thead>
            <tbody id="compliance-tbody">{rows}</tbody>
        </table>
        <div class="chart"><canvas id="trends-chart"></canvas></div>
    </div>
{scripts}
</body>
</html>
"#,
            last_updated = escape_html(&last_updated_text(self.last_updated)),
            scripts = chart_scripts("trends-chart", &chart),
        ))
    }
}

/// Detail view for a single system: the current result and its trend chart.
pub fn render_detail(
    result: &SystemResult,
    commit_url_base: &str,
    chart: &ChartSpec,
) -> Result<String> {
    let identifier = &result.identifier;
    let name = escape_html(&identifier.to_uppercase());
    let date = result
        .timestamp
        .map_or_else(|| "Never".to_string(), |ts| ts.format("%Y-%m-%d").to_string());
    let commit = CommitCell::new(identifier, result.commit.as_deref(), commit_url_base);
    let badge = Badge::for_result(result);
    let chart = embed_json(&chart.to_json(false)?);

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{name} Compliance</title>
    <style>{STYLE}</style>
</head>
<body>
    <div class="container">
        <p><a href="../index.html">&larr; Back to dashboard</a></p>
        <h1>{name}</h1>
        <table>
            <thead>
                <tr><th>Date</th><th>Commit</th><th>Results</th><th>Pass Rate</th></tr>
            </thead>
            <tbody id="history-tbody">
                <tr><td>{date}</td><td>{commit}</td><td>{badge}</td><td>{rate:.1}%</td></tr>
            </tbody>
        </table>
        <div class="chart"><canvas id="detail-chart"></canvas></div>
    </div>
{scripts}
</body>
</html>
"#,
        date = escape_html(&date),
        commit = commit.to_html(),
        badge = badge.to_html(),
        rate = result.pass_rate,
        scripts = chart_scripts("detail-chart", &chart),
    ))
}

fn chart_scripts(canvas_id: &str, chart_json: &str) -> String {
    format!(
        r#"    <script src="{CHART_JS}"></script>
    <script src="{CHART_ADAPTER_JS}"></script>
    <script id="{canvas_id}-data" type="application/json">{chart_json}</script>
    <script>
        (function () {{
            var canvas = document.getElementById("{canvas_id}");
            var spec = document.getElementById("{canvas_id}-data");
            if (canvas && spec && window.Chart) {{
                new Chart(canvas, JSON.parse(spec.textContent));
            }}
        }})();
    </script>"#
    )
}

/// Keeps embedded JSON from closing its `<script>` element early.
fn embed_json(json: &str) -> String {
    json.replace("</", "<\\/").replace("<!--", "<\\!--")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{chart, table::TableRenderer};
    use crate::status::StatusSnapshot;
    use chrono::TimeZone;
    use indexmap::IndexMap;

    #[test]
    fn test_last_updated_text() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 5).unwrap();

        assert_eq!(
            last_updated_text(Some(ts)),
            "Last updated: 2025-03-01 12:30:05 UTC"
        );
        assert_eq!(last_updated_text(None), "Last updated: Never");
    }

    #[test]
    fn test_index_page_for_empty_snapshot() {
        let snapshot = StatusSnapshot::empty();
        let rows = TableRenderer::default().render(&snapshot);
        let spec = chart::render(&IndexMap::new(), chart::TRENDS_TITLE);

        let html = IndexPage {
            last_updated: None,
            cards: &[],
            rows: &rows,
            chart: &spec,
        }
        .render()
        .unwrap();

        assert!(html.contains("Last updated: Never"));
        assert!(html.contains("No results yet"));
        assert!(html.contains(r#""datasets":[]"#));
    }

    #[test]
    fn test_embed_json_escapes_script_close() {
        assert_eq!(embed_json(r#"{"a":"</script>"}"#), r#"{"a":"<\/script>"}"#);
        assert_eq!(embed_json("<!-- x"), "<\\!-- x");
    }

    #[test]
    fn test_detail_page_shows_current_result() {
        let now = Utc::now();
        let snapshot = StatusSnapshot::demo(now);
        let sp1 = &snapshot.systems["sp1"];
        let spec = chart::render(&IndexMap::new(), "SP1");

        let html = render_detail(sp1, "https://github.com/codygunton", &spec).unwrap();

        assert!(html.contains("<h1>SP1</h1>"));
        assert!(html.contains("46/47"));
        assert!(html.contains("badge fail"));
        assert!(html.contains("97.9%"));
        assert!(html.contains("https://github.com/codygunton/sp1/commit/fc98075a"));
    }
}
