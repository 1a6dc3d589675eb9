//! Server-rendered HTML pages
//!
//! Every page shares one layout: a header with the title, nav links for home
//! and each workplace, and build identification. All interpolated text goes
//! through [`escape_html`].

use trafficnet_common::config::{LabelSchema, WorkplaceConfig};
use trafficnet_common::db::ReviewProgress;

use crate::api::BuildInfo;
use crate::services::Sample;

const STYLE_CSS: &str = include_str!("../ui/style.css");
const LABEL_JS: &str = include_str!("../ui/label.js");

/// Nav key for the home page
pub const HOME: &str = "home";
/// Nav key for the label reference page
pub const EXAMPLES: &str = "examples";

/// Escape text for HTML element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn nav_link(href: &str, label: &str, active: bool) -> String {
    format!(
        r#"<a class="{}" href="{}">{}</a>"#,
        if active { "active" } else { "" },
        escape_html(href),
        escape_html(label)
    )
}

fn header(active: &str, workplaces: &[WorkplaceConfig]) -> String {
    let mut links = vec![nav_link("/", "Home", active == HOME)];
    links.extend(workplaces.iter().map(|w| {
        let slug = w.slug();
        nav_link(&format!("/label/{}", slug), &w.id, active == slug)
    }));
    links.push(nav_link("/examples", "Examples", active == EXAMPLES));

    format!(
        r#"<header class="header">
    <div>
        <span class="head-text">TrafficNet - Labeling Interface</span>
        <div class="caption">v{} [{}]</div>
    </div>
    <nav class="nav">{}</nav>
</header>"#,
        BuildInfo::CURRENT.version,
        BuildInfo::CURRENT.git_hash,
        links.join("")
    )
}

/// Wrap page content in the shared layout; `script` is inlined when present
fn layout(
    title: &str,
    active: &str,
    workplaces: &[WorkplaceConfig],
    body: &str,
    script: Option<&str>,
) -> String {
    let script = script
        .map(|js| format!("<script>\n{}\n</script>", js))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="theme-color" content="rgb(0, 0, 0)">
    <title>{}</title>
    <style>
{}
    </style>
</head>
<body>
{}
<main>
{}
</main>
{}
</body>
</html>"#,
        escape_html(title),
        STYLE_CSS,
        header(active, workplaces),
        body,
        script
    )
}

fn radio_group(name: &str, title: &str, tooltip: &str, options: &[String], default: &str) -> String {
    let inputs: Vec<String> = options
        .iter()
        .map(|option| {
            format!(
                r#"<label><input type="radio" name="{name}" value="{value}"{checked}> {value}</label>"#,
                name = escape_html(name),
                value = escape_html(option),
                checked = if option == default { " checked" } else { "" },
            )
        })
        .collect();

    format!(
        r#"<legend title="{}">{}</legend>{}"#,
        escape_html(tooltip),
        escape_html(title),
        inputs.join("\n")
    )
}

fn label_form(workplace: &WorkplaceConfig, sample: &Sample) -> String {
    let schema: &LabelSchema = &workplace.schema;

    let lanes: Vec<String> = schema
        .lanes
        .iter()
        .map(|lane| {
            format!(
                r#"<fieldset data-lane="{}">{}</fieldset>"#,
                escape_html(&lane.key),
                radio_group(
                    &format!("lane-{}", lane.key),
                    &lane.title,
                    &lane.tooltip,
                    &schema.congestion,
                    &schema.congestion_default,
                )
            )
        })
        .collect();

    let precipitation = radio_group(
        "precipitation",
        "Precipitation",
        "Weather visible in the image. Select only one.",
        &schema.precipitation,
        &schema.precipitation_default,
    );

    format!(
        r#"<form id="labels" data-image-id="{image_id}" data-reviewer="{reviewer}" onsubmit="return false;">
    <h2>Congestion</h2>
    {lanes}
    <h2>Weather</h2>
    <fieldset>{precipitation}</fieldset>
    <div class="actions">
        <button type="button" id="submit">Submit</button>
        <button type="button" id="new-sample">New Sample</button>
        <button type="button" id="mark-obstructed">Mark Obstructed</button>
    </div>
    <p id="error"></p>
    <p id="status"></p>
</form>"#,
        image_id = escape_html(&sample.image_id),
        reviewer = escape_html(&workplace.reviewer),
        lanes = lanes.join("\n    "),
        precipitation = precipitation,
    )
}

/// Labeling page for one sample
pub fn label_page(workplaces: &[WorkplaceConfig], workplace: &WorkplaceConfig, sample: &Sample) -> String {
    let body = format!(
        r#"<section class="sample">
    <div>
        <img src="{content}" alt="{name}">
        <p class="caption">{name} ({id})</p>
    </div>
    {form}
</section>"#,
        content = escape_html(&sample.image_content),
        name = escape_html(&sample.image_name),
        id = escape_html(&sample.image_id),
        form = label_form(workplace, sample),
    );

    layout(
        &format!("TrafficNet - {}", workplace.id),
        &workplace.slug(),
        workplaces,
        &body,
        Some(LABEL_JS),
    )
}

/// Shown instead of the labeling page once no unreviewed sample remains
pub fn exhausted_page(workplaces: &[WorkplaceConfig], workplace: &WorkplaceConfig) -> String {
    let body = r#"<h1>Dataset exhausted</h1>
<p>Every sample has been reviewed. Thank you for your help.</p>
<p><a href="/">Back to home</a></p>"#;

    layout(
        &format!("TrafficNet - {}", workplace.id),
        &workplace.slug(),
        workplaces,
        body,
        None,
    )
}

/// Home page with review progress
pub fn home_page(workplaces: &[WorkplaceConfig], progress: &ReviewProgress, username: &str) -> String {
    let links: Vec<String> = workplaces
        .iter()
        .map(|w| {
            format!(
                r#"<li><a href="/label/{}">Label as {}</a></li>"#,
                escape_html(&w.slug()),
                escape_html(&w.id)
            )
        })
        .collect();

    let body = format!(
        r#"<h1>Welcome, {user}</h1>
<p>Pick your workplace to start labeling. See the <a href="/examples">examples page</a> for what each label means.</p>
<ul>
{links}
</ul>
<h2>Progress</h2>
<table class="progress">
    <tr><th>Total samples</th><td>{total}</td></tr>
    <tr><th>Labeled</th><td>{labeled}</td></tr>
    <tr><th>Obstructed</th><td>{obstructed}</td></tr>
    <tr><th>Remaining</th><td>{remaining}</td></tr>
</table>"#,
        user = escape_html(username),
        links = links.join("\n"),
        total = progress.total,
        labeled = progress.labeled,
        obstructed = progress.obstructed,
        remaining = progress.remaining(),
    );

    layout("TrafficNet", HOME, workplaces, &body, None)
}

fn describe_congestion(option: &str) -> &'static str {
    match option {
        "congested" => "Vehicles are backed up or moving well below highway speed.",
        "vacant" => "Traffic flows freely or the lane is empty.",
        "unclear" => "The lane cannot be judged: glare, darkness, distance or a partial view.",
        _ => "",
    }
}

fn describe_precipitation(option: &str) -> &'static str {
    match option {
        "rain" => "Visible rainfall, wet glare on the road or droplets on the lens.",
        "snow" => "Falling snow or snow covering the roadway.",
        "fog" => "Haze or fog reducing visibility down the highway.",
        "clear" => "No precipitation visible.",
        _ => "",
    }
}

fn definition_rows(options: &[String], describe: fn(&str) -> &'static str) -> String {
    options
        .iter()
        .map(|option| {
            format!(
                "<tr><th>{}</th><td>{}</td></tr>",
                escape_html(option),
                escape_html(describe(option))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Label reference page
pub fn examples_page(workplaces: &[WorkplaceConfig]) -> String {
    let schema = workplaces
        .first()
        .map(|w| w.schema.clone())
        .unwrap_or_default();

    let body = format!(
        r#"<h1>Examples</h1>
<h2>Lane congestion</h2>
<table class="progress">
{congestion}
</table>
<h2>Precipitation</h2>
<table class="progress">
{precipitation}
</table>
<h2>Obstructed</h2>
<p>Use <strong>Mark Obstructed</strong> when the camera view is blocked, frozen or shows no highway at all. No other labels are needed.</p>"#,
        congestion = definition_rows(&schema.congestion, describe_congestion),
        precipitation = definition_rows(&schema.precipitation, describe_precipitation),
    );

    layout("TrafficNet - Examples", EXAMPLES, workplaces, &body, None)
}
