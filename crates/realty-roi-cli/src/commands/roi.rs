use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use realty_roi_core::roi::projection::{self, ProjectionAssumptions};
use realty_roi_core::roi::{self as roi_engine, LocalMarketReference, RoiInput};
use realty_roi_core::scenarios;
use realty_roi_core::{Scenario, SensitivityVariable, SweepValues};

use crate::input;

/// Arguments for a single-property ROI computation
#[derive(Args)]
pub struct RoiArgs {
    /// Path to property input file (JSON or YAML)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to local market reference file; built-in bands when omitted
    #[arg(long)]
    pub market: Option<String>,
}

/// Arguments for ranking several properties
#[derive(Args)]
pub struct CompareArgs {
    /// Path to a file holding an array of property inputs
    #[arg(long)]
    pub input: Option<String>,

    /// Path to local market reference file
    #[arg(long)]
    pub market: Option<String>,
}

/// Arguments for sensitivity sweeps
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to base property input file
    #[arg(long)]
    pub input: Option<String>,

    /// Sweep variable as name:min:max:step (e.g. "vacancy_rate:0:0.15:0.05")
    /// or name:v1,v2,v3. Repeatable.
    #[arg(long = "var")]
    pub vars: Vec<String>,

    /// Path to a file holding an array of sweep variables
    #[arg(long)]
    pub variables: Option<String>,

    /// Path to local market reference file
    #[arg(long)]
    pub market: Option<String>,
}

/// Arguments for what-if scenarios
#[derive(Args)]
pub struct ScenarioArgs {
    /// Path to base property input file
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a file holding an array of scenarios
    #[arg(long)]
    pub scenarios: String,

    /// Path to local market reference file
    #[arg(long)]
    pub market: Option<String>,
}

/// Arguments for the holding-period projection
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to property input file
    #[arg(long)]
    pub input: Option<String>,

    /// Annual rent growth applied from year 2
    #[arg(long, default_value = "0")]
    pub rent_growth: Decimal,

    /// Annual operating expense growth applied from year 2
    #[arg(long, default_value = "0")]
    pub expense_growth: Decimal,

    /// Path to local market reference file
    #[arg(long)]
    pub market: Option<String>,
}

fn parse_sweep_var(spec: &str) -> Result<SensitivityVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    let values = match parts.as_slice() {
        [_, list] => SweepValues::List(
            list.split(',')
                .map(|v| v.trim().parse::<Decimal>())
                .collect::<Result<Vec<_>, _>>()?,
        ),
        [_, min, max, step] => SweepValues::Stepped {
            min: min.parse()?,
            max: max.parse()?,
            step: step.parse()?,
        },
        _ => {
            return Err(format!(
                "Sweep variable must be name:min:max:step or name:v1,v2,..., got '{}'",
                spec
            )
            .into())
        }
    };
    Ok(SensitivityVariable {
        name: parts[0].to_string(),
        values,
    })
}

pub fn run_roi(args: RoiArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let property: RoiInput = input::read_input(args.input.as_deref(), "ROI computation")?;
    let refs: LocalMarketReference = input::read_optional(args.market.as_deref())?;
    let result = roi_engine::compute_roi(&property, &refs)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let properties: Vec<RoiInput> =
        input::read_input(args.input.as_deref(), "property comparison")?;
    let refs: LocalMarketReference = input::read_optional(args.market.as_deref())?;
    let result = roi_engine::compare_properties(&properties, &refs)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let property: RoiInput = input::read_input(args.input.as_deref(), "sensitivity analysis")?;
    let refs: LocalMarketReference = input::read_optional(args.market.as_deref())?;

    let mut variables: Vec<SensitivityVariable> = input::read_optional(args.variables.as_deref())?;
    for spec in &args.vars {
        variables.push(parse_sweep_var(spec)?);
    }

    let result = scenarios::sensitivity_analysis(&property, &variables, &refs)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_scenarios(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let property: RoiInput = input::read_input(args.input.as_deref(), "scenario analysis")?;
    let refs: LocalMarketReference = input::read_optional(args.market.as_deref())?;
    let scenario_list: Vec<Scenario> = input::file::read_document(&args.scenarios)?;
    let result = scenarios::run_roi_scenarios(&property, &scenario_list, &refs)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let property: RoiInput = input::read_input(args.input.as_deref(), "holding-period projection")?;
    let refs: LocalMarketReference = input::read_optional(args.market.as_deref())?;
    let assumptions = ProjectionAssumptions {
        rent_growth: args.rent_growth,
        expense_growth: args.expense_growth,
    };
    let result = projection::project_holding_period(&property, &assumptions, &refs)?;
    Ok(serde_json::to_value(result)?)
}
