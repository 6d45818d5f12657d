//! Themed SVG rendering of an [`AggregatedStats`] record.
//!
//! Rendering is pure: no I/O, no clock, no randomness. The same stats record
//! and theme always produce byte-identical output. Sections with no data
//! (empty language distribution, no highlights) are skipped entirely and
//! contribute no height.

use crate::stats::{AggregatedStats, LanguageShare, RepoHighlight};

const WIDTH: i32 = 900;
const LEFT_MARGIN: i32 = 50;
const VALUE_X: i32 = 250;
const RIGHT_COL_X: i32 = 520;
const HEADER_Y: i32 = 60;
const PANEL_START_Y: i32 = 100;
const LINE_HEIGHT: i32 = 24;
const SECTION_GAP: i32 = 20;

const BOX_X: i32 = 40;
const BOX_WIDTH: i32 = 820;

const BAR_X: i32 = 220;
const BAR_MAX_WIDTH: f64 = 300.0;
const BAR_HEIGHT: i32 = 12;
const BAR_SPACING: i32 = 28;

const ENTRY_HEIGHT: i32 = 56;
const DESCRIPTION_LIMIT: usize = 70;
const NO_DESCRIPTION: &str = "No description provided";
const NO_LANGUAGE: &str = "N/A";

const FOOTER_MARGIN: i32 = 50;

#[derive(Clone, Copy)]
pub enum Theme {
    Light,
    Dark,
}

pub struct ThemeColors {
    pub bg: &'static str,
    pub text: &'static str,
    pub key: &'static str,
    pub value: &'static str,
    pub border: &'static str,
    pub comment: &'static str,
    pub chart: &'static [&'static str],
}

impl Theme {
    pub fn colors(self) -> ThemeColors {
        match self {
            Theme::Light => ThemeColors {
                bg: "#f6f8fa",
                text: "#24292f",
                key: "#953800",
                value: "#0a3069",
                border: "#d0d7de",
                comment: "#c2cfde",
                chart: &["#0969da", "#1a7f37", "#9a6700", "#cf222e", "#8250df"],
            },
            Theme::Dark => ThemeColors {
                bg: "#0d1117",
                text: "#c9d1d9",
                key: "#f0883e",
                value: "#58a6ff",
                border: "#30363d",
                comment: "#8b949e",
                chart: &["#58a6ff", "#3fb950", "#d29922", "#f85149", "#bc8cff"],
            },
        }
    }
}

/// Fixed report content: identity lines, interest and tooling bullets.
/// Injectable so tests can render with a minimal configuration.
pub struct RenderConfig {
    pub role: &'static str,
    pub certs: &'static str,
    pub interests_title: &'static str,
    pub interests: &'static [&'static str],
    pub tools_title: &'static str,
    pub tools: &'static [&'static str],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            role: "Senior Security Engineer",
            certs: "CCSP | CISSP",
            interests_title: "Security",
            interests: &[
                "DevSecOps & Security Architecture",
                "Cloud Security (AWS, Azure)",
                "Threat Modeling & Risk Assessment",
                "Incident Response & Investigation",
                "Container Security & Orchestration",
                "Vulnerability Management",
                "Application Security",
                "Compliance & Standards Development",
            ],
            tools_title: "Tools",
            tools: &[
                "IAM & Identity Management",
                "SIEM & Log Analysis",
                "Security Automation & CI/CD",
                "Containers & Kubernetes",
                "Infrastructure as Code",
            ],
        }
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn truncate_description(description: Option<&str>) -> String {
    match description {
        None => NO_DESCRIPTION.to_string(),
        Some(d) if d.chars().count() > DESCRIPTION_LIMIT => {
            let cut: String = d.chars().take(DESCRIPTION_LIMIT).collect();
            format!("{cut}...")
        }
        Some(d) => d.to_string(),
    }
}

enum PanelRow {
    Title(String),
    Separator,
    KeyValue(&'static str, String),
    SectionKey(&'static str),
    Bullet(String),
    Blank,
}

fn panel_row_markup(row: &PanelRow, x: i32, y: i32) -> String {
    match row {
        PanelRow::Title(text) => format!(
            "<text x=\"{x}\" y=\"{y}\" class=\"value\">{}</text>\n",
            escape_xml(text)
        ),
        PanelRow::Separator => format!(
            "<text x=\"{x}\" y=\"{y}\" class=\"comment\">{}</text>\n",
            "-".repeat(50)
        ),
        PanelRow::KeyValue(key, value) => format!(
            "<text x=\"{x}\" y=\"{y}\" class=\"key\">{}:</text><text x=\"{VALUE_X}\" y=\"{y}\" class=\"value\">{}</text>\n",
            escape_xml(key),
            escape_xml(value)
        ),
        PanelRow::SectionKey(key) => format!(
            "<text x=\"{x}\" y=\"{y}\" class=\"key\">{}</text>\n",
            escape_xml(key)
        ),
        PanelRow::Bullet(item) => format!(
            "<text x=\"{x}\" y=\"{y}\" class=\"value\">  \u{2022} {}</text>\n",
            escape_xml(item)
        ),
        PanelRow::Blank => String::new(),
    }
}

/// Two-column identity/skills panel. Returns the Y consumed; panel height is
/// the taller column's row count at constant line height.
fn render_identity_panel(
    out: &mut String,
    stats: &AggregatedStats,
    config: &RenderConfig,
    start_y: i32,
) -> i32 {
    let mut left = vec![
        PanelRow::Title(format!("{}@github", stats.username)),
        PanelRow::Separator,
        PanelRow::KeyValue("Name", stats.name.clone()),
        PanelRow::KeyValue("Role", config.role.to_string()),
        PanelRow::KeyValue("Certs", config.certs.to_string()),
        PanelRow::Blank,
        PanelRow::SectionKey(config.interests_title),
    ];
    left.extend(
        config
            .interests
            .iter()
            .map(|item| PanelRow::Bullet((*item).to_string())),
    );

    let mut right = vec![PanelRow::SectionKey(config.tools_title)];
    right.extend(
        config
            .tools
            .iter()
            .map(|item| PanelRow::Bullet((*item).to_string())),
    );

    for (i, row) in left.iter().enumerate() {
        out.push_str(&panel_row_markup(
            row,
            LEFT_MARGIN,
            start_y + i as i32 * LINE_HEIGHT,
        ));
    }
    for (i, row) in right.iter().enumerate() {
        out.push_str(&panel_row_markup(
            row,
            RIGHT_COL_X,
            start_y + i as i32 * LINE_HEIGHT,
        ));
    }

    let rows = left.len().max(right.len()) as i32;
    start_y + rows * LINE_HEIGHT
}

/// Bordered block of one proportional bar per language, highest share first.
fn render_language_chart(
    out: &mut String,
    languages: &[LanguageShare],
    colors: &ThemeColors,
    box_y: i32,
) -> i32 {
    let title_y = box_y + 32;
    let first_row_y = title_y + 32;
    let last_row_y = first_row_y + (languages.len() as i32 - 1) * BAR_SPACING;
    let box_bottom = last_row_y + 16;

    out.push_str(&format!(
        "<rect x=\"{BOX_X}\" y=\"{box_y}\" width=\"{BOX_WIDTH}\" height=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1\" rx=\"6\"/>\n",
        box_bottom - box_y,
        colors.border
    ));
    out.push_str(&format!(
        "<text x=\"{LEFT_MARGIN}\" y=\"{title_y}\" class=\"key\">Language Distribution</text>\n"
    ));

    for (rank, share) in languages.iter().enumerate() {
        let row_y = first_row_y + rank as i32 * BAR_SPACING;
        let bar_y = row_y - BAR_HEIGHT + 2;
        let bar_width = share.percent / 100.0 * BAR_MAX_WIDTH;
        let color = colors.chart[rank % colors.chart.len()];

        out.push_str(&format!(
            "<text x=\"{LEFT_MARGIN}\" y=\"{row_y}\" class=\"value\">{}</text>\n",
            escape_xml(&share.name)
        ));
        out.push_str(&format!(
            "<rect x=\"{BAR_X}\" y=\"{bar_y}\" width=\"{bar_width:.1}\" height=\"{BAR_HEIGHT}\" fill=\"{color}\" rx=\"2\"/>\n"
        ));
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{row_y}\" class=\"comment\">{:.1}%</text>\n",
            BAR_X + BAR_MAX_WIDTH as i32 + 16,
            share.percent
        ));
    }

    box_bottom
}

/// Bordered block of up to three top repositories.
fn render_highlights(out: &mut String, repos: &[RepoHighlight], colors: &ThemeColors, box_y: i32) -> i32 {
    let title_y = box_y + 32;
    let first_name_y = title_y + 36;
    let last_desc_y = first_name_y + (repos.len() as i32 - 1) * ENTRY_HEIGHT + 22;
    let box_bottom = last_desc_y + 18;

    out.push_str(&format!(
        "<rect x=\"{BOX_X}\" y=\"{box_y}\" width=\"{BOX_WIDTH}\" height=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1\" rx=\"6\"/>\n",
        box_bottom - box_y,
        colors.border
    ));
    out.push_str(&format!(
        "<text x=\"{LEFT_MARGIN}\" y=\"{title_y}\" class=\"key\">Top Repositories</text>\n"
    ));

    for (i, repo) in repos.iter().enumerate() {
        let name_y = first_name_y + i as i32 * ENTRY_HEIGHT;
        let desc_y = name_y + 22;

        let stars = if repo.stars > 0 {
            format!("<tspan class=\"comment\"> \u{2605} {}</tspan>", repo.stars)
        } else {
            String::new()
        };
        let language = escape_xml(repo.language.as_deref().unwrap_or(NO_LANGUAGE));
        let description = escape_xml(&truncate_description(repo.description.as_deref()));

        out.push_str(&format!(
            "<text x=\"{LEFT_MARGIN}\" y=\"{name_y}\" class=\"key\">{}{stars}<tspan class=\"value\"> [{language}]</tspan></text>\n",
            escape_xml(&repo.name)
        ));
        out.push_str(&format!(
            "<text x=\"{LEFT_MARGIN}\" y=\"{desc_y}\" class=\"value\">{description}</text>\n"
        ));
    }

    box_bottom
}

/// Render the full document for one theme.
pub fn generate_svg(stats: &AggregatedStats, theme: Theme, config: &RenderConfig) -> String {
    let colors = theme.colors();
    let mut body = String::new();

    body.push_str(&format!(
        "<text x=\"{LEFT_MARGIN}\" y=\"{HEADER_Y}\" class=\"header\">{}'s GitHub Profile</text>\n",
        escape_xml(&stats.name)
    ));

    let mut y = render_identity_panel(&mut body, stats, config, PANEL_START_Y);

    if !stats.languages.is_empty() {
        y = render_language_chart(&mut body, &stats.languages, &colors, y + SECTION_GAP);
    }

    if !stats.top_repos.is_empty() {
        y = render_highlights(&mut body, &stats.top_repos, &colors, y + SECTION_GAP);
    }

    let footer_y = y + FOOTER_MARGIN;
    body.push_str(&format!(
        "<text x=\"{LEFT_MARGIN}\" y=\"{footer_y}\" class=\"footer\">Last updated: {}</text>\n",
        escape_xml(&stats.generated_at)
    ));

    let height = footer_y + 30;

    format!(
        r#"<svg width="{WIDTH}" height="{height}" xmlns="http://www.w3.org/2000/svg">
<style>
text {{
    font-family: 'Consolas', 'Monaco', 'Courier New', monospace;
    font-size: 16px;
}}
.header {{ fill: {text}; font-weight: 700; font-size: 18px; }}
.key {{ fill: {key}; font-weight: 600; }}
.value {{ fill: {value}; }}
.comment {{ fill: {comment}; }}
.footer {{ fill: {comment}; font-size: 12px; }}
</style>
<rect width="{WIDTH}" height="{height}" fill="{bg}" rx="10"/>
<rect width="{inner_w}" height="{inner_h}" x="10" y="10" fill="{bg}" stroke="{border}" stroke-width="2" rx="8"/>
{body}</svg>
"#,
        text = colors.text,
        key = colors.key,
        value = colors.value,
        comment = colors.comment,
        bg = colors.bg,
        border = colors.border,
        inner_w = WIDTH - 20,
        inner_h = height - 20,
    )
}
