use anyhow::{anyhow, bail, Context};
use cascading_selector::{CascadingSelector, RoleContext, SelectionSnapshot};
use config::Settings;
use mirror_store::{InMemoryMirrorStore, MirrorSnapshot};
use remote_procedures::{CampaignOperations, DashboardQuery, HttpGateway};
use std::sync::Arc;

mod config;

/// Selections passed as `key=value` arguments, plus the bare `stats` flag.
#[derive(Debug, Default, PartialEq, Eq)]
struct Choices {
    county: Option<String>,
    area: Option<String>,
    precinct: Option<String>,
    precinct_code: Option<String>,
    with_statistics: bool,
}

impl Choices {
    fn from_args(args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut choices = Choices::default();
        for arg in args {
            if arg == "stats" {
                choices.with_statistics = true;
                continue;
            }
            let (key, value) = arg
                .split_once('=')
                .ok_or_else(|| anyhow!("Expected key=value, got {arg}"))?;
            let value = Some(value.to_string());
            match key {
                "county" => choices.county = value,
                "area" => choices.area = value,
                "precinct" => choices.precinct = value,
                "precinct_code" => choices.precinct_code = value,
                _ => bail!("Unknown option {key}"),
            }
        }
        Ok(choices)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shared_kernel::tracing::config_telemetry("selector_preview")?;
    let choices = Choices::from_args(std::env::args().skip(1))?;
    start(choices).await
}

async fn start(choices: Choices) -> anyhow::Result<()> {
    let settings = Settings::parse()?;

    let store = Arc::new(InMemoryMirrorStore::new());
    MirrorSnapshot::from_json_file(&settings.preview.snapshot_path)?
        .apply_to(store.as_ref())
        .context("Failed to load the mirror snapshot")?;

    let claims = std::fs::read_to_string(&settings.preview.claims_path).with_context(|| {
        format!(
            "Failed to read role claims {}",
            settings.preview.claims_path.display()
        )
    })?;
    let context = RoleContext::from_claims(
        serde_json::from_str(&claims).context("Role claims are not valid json")?,
    )?;
    let role = context.role.clone();
    let selector = CascadingSelector::mount(store.clone(), context)
        .ok_or_else(|| anyhow!("The {role:?} role does not get a geography selector"))?;

    let snapshot = apply_choices(&selector, &choices)?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    if choices.with_statistics {
        print_statistics(&snapshot).await?;
    }
    Ok(())
}

fn apply_choices(
    selector: &CascadingSelector,
    choices: &Choices,
) -> anyhow::Result<SelectionSnapshot> {
    let mut snapshot = selector.snapshot();
    if let Some(county) = &choices.county {
        snapshot = selector.select_county(Some(county.as_str().into()));
    }
    if let Some(area) = &choices.area {
        snapshot = selector.select_area(Some(area.as_str().into()));
    }
    if let Some(precinct) = &choices.precinct {
        snapshot = selector.select_precinct(Some(precinct.as_str().into()));
    }
    if let Some(code) = &choices.precinct_code {
        snapshot = selector
            .select_precinct_by_code(code)
            .ok_or_else(|| anyhow!("No precinct of the selected area has code {code}"))?;
    }
    Ok(snapshot)
}

async fn print_statistics(snapshot: &SelectionSnapshot) -> anyhow::Result<()> {
    let operations = CampaignOperations::new(Arc::new(HttpGateway::from_configuration()?));
    let filter = snapshot.report_filter.clone();
    let query = DashboardQuery {
        county: filter.county.map(String::from),
        area: filter.area,
        precinct: filter.precinct,
    };
    match operations.dashboard_statistics(query).await {
        Ok(statistics) => {
            println!("{}", serde_json::to_string_pretty(&statistics)?);
            Ok(())
        }
        Err(err) => {
            tracing::error!(transient = err.is_transient(), "dashboard statistics failed: {err:?}");
            bail!("{err}")
        }
    }
}
