//! CLI subcommands: init, validate, synth, plan, policy, schema, completions.

use crate::core::{parser, planner, synth, types};
use crate::error::{Error, Result};
use crate::policy::{DeployContext, Identity, PolicyKind};
use crate::stack::{baseline, cluster, manifest::Manifests};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "eksforge",
    version,
    about = "EKS cluster and baseline add-on stacks as CloudFormation templates"
)]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which stack to synthesize from the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StackKind {
    /// Baseline add-ons, each behind a deploy parameter
    #[default]
    Baseline,
    /// Cluster-side IAM, managed add-ons and nodegroup
    Cluster,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new eksforge project
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Validate eksforge.yaml
    Validate {
        /// Path to eksforge.yaml
        #[arg(short, long, default_value = "eksforge.yaml")]
        file: PathBuf,
    },

    /// Synthesize the CloudFormation template
    Synth {
        /// Path to eksforge.yaml
        #[arg(short, long, default_value = "eksforge.yaml")]
        file: PathBuf,

        /// Write the template here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stack to synthesize
        #[arg(short, long, value_enum, default_value_t = StackKind::Baseline)]
        stack: StackKind,

        /// Base directory for manifest paths (default: the config's directory)
        #[arg(long)]
        manifests_dir: Option<PathBuf>,
    },

    /// Show which resources a deployment would provision
    Plan {
        /// Path to eksforge.yaml
        #[arg(short, long, default_value = "eksforge.yaml")]
        file: PathBuf,

        /// Parameter value, NAME=VALUE (repeatable)
        #[arg(short, long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,

        /// Stack to plan
        #[arg(short, long, value_enum, default_value_t = StackKind::Baseline)]
        stack: StackKind,

        /// Base directory for manifest paths (default: the config's directory)
        #[arg(long)]
        manifests_dir: Option<PathBuf>,
    },

    /// Print one add-on's IAM policy document
    Policy {
        /// Which policy
        #[arg(short, long, value_enum)]
        kind: PolicyKind,

        /// Cluster the policy is scoped to
        #[arg(short, long, default_value = "myekscluster")]
        cluster_name: String,

        #[arg(long, env = "CDK_DEFAULT_REGION")]
        region: String,

        #[arg(long, env = "CDK_DEFAULT_ACCOUNT")]
        account: String,

        #[arg(long, default_value = "aws")]
        partition: String,
    },

    /// Print the eksforge.yaml JSON schema
    Schema,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Synth {
            file,
            output,
            stack,
            manifests_dir,
        } => cmd_synth(&file, output.as_deref(), stack, manifests_dir.as_deref()),
        Commands::Plan {
            file,
            params,
            stack,
            manifests_dir,
        } => cmd_plan(&file, &params, stack, manifests_dir.as_deref()),
        Commands::Policy {
            kind,
            cluster_name,
            region,
            account,
            partition,
        } => cmd_policy(
            kind,
            &cluster_name,
            &DeployContext::new(partition, region, account),
        ),
        Commands::Schema => cmd_schema(),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "eksforge", &mut std::io::stdout());
            Ok(())
        }
    }
}

const STARTER_CONFIG: &str = r#"version: "1.0"
name: my-baseline
stack_prefix: ""

env:
  partition: aws
  # account and region fall back to CDK_DEFAULT_ACCOUNT / CDK_DEFAULT_REGION

cluster:
  name: myekscluster
  vpc_id: vpc-00000000
  oidc_issuer: oidc.eks.us-east-1.amazonaws.com/id/EXAMPLE
  kubectl_service_token: arn:aws:lambda:us-east-1:000000000000:function:kubectl-provider
  kubectl_role_arn: arn:aws:iam::000000000000:role/kubectl-provider

addons:
  ebs_driver: false

helm_versions:
  cluster-autoscaler-helm-version: 9.10.7
  aws-load-balancer-controller-helm-version: 1.2.7
  aws-ebs-csi-driver-helm-version: 2.1.0
  aws-efs-csi-driver-helm-version: 2.1.4
  secrets-store-csi-helm-version: 0.1.0
  aws-calico-helm-version: 0.3.5

manifests: {}
  # fluent_bit: manifests/fluentBitSetup.yaml
  # aws_secrets: manifests/awsSecretsManifest.yaml
  # container_insights: manifests/otelContainerInsights.yaml
  # metric_server: manifests/metricServerManifest.yaml

# cluster stack (eksforge synth --stack cluster)
addon_versions: {}
  # eks-addon-vpc-cni-version: v1.9.0-eksbuild.1
  # eks-addon-kube-proxy-version: v1.21.2-eksbuild.2
  # eks-addon-coredns-version: v1.8.4-eksbuild.1
# nodegroup:
#   subnet_ids: [subnet-00000000, subnet-11111111]
"#;

fn cmd_init(path: &Path) -> Result<()> {
    let config_path = path.join("eksforge.yaml");
    if config_path.exists() {
        return Err(Error::InvalidArgument(format!(
            "{} already exists",
            config_path.display()
        )));
    }

    let manifests_dir = path.join("manifests");
    std::fs::create_dir_all(&manifests_dir).map_err(|e| Error::io(&manifests_dir, e))?;
    std::fs::write(&config_path, STARTER_CONFIG).map_err(|e| Error::io(&config_path, e))?;

    println!("Initialized eksforge project at {}", path.display());
    println!("  Created: {}", config_path.display());
    println!("  Created: {}/", manifests_dir.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<()> {
    let config = parse_and_validate(file)?;
    println!(
        "OK: {} (cluster {}, {} helm version(s))",
        config.name,
        config.cluster.name,
        config.helm_versions.len()
    );
    Ok(())
}

/// Parse and validate a config file, printing every problem found.
fn parse_and_validate(file: &Path) -> Result<types::EksforgeConfig> {
    let config = parser::parse_config_file(file)?;
    let errors = parser::validate_config(&config);
    if errors.is_empty() {
        return Ok(config);
    }
    for e in &errors {
        eprintln!("  ERROR: {}", e);
    }
    Err(Error::Validation(errors.len()))
}

/// Config file to synthesized template.
fn load_template(
    file: &Path,
    kind: StackKind,
    manifests_dir: Option<&Path>,
) -> Result<synth::Template> {
    let config = parse_and_validate(file)?;
    let ctx = parser::resolve_context(&config, parser::process_env)?;
    let stack = match kind {
        StackKind::Baseline => {
            let base = manifests_dir
                .map(Path::to_path_buf)
                .unwrap_or_else(|| file.parent().map(Path::to_path_buf).unwrap_or_default());
            let manifests = Manifests::load(&config.manifests, &base)?;
            baseline::build(&config, ctx, &manifests)?
        }
        StackKind::Cluster => cluster::build(&config, ctx)?,
    };
    synth::synthesize(&stack)
}

fn cmd_synth(
    file: &Path,
    output: Option<&Path>,
    kind: StackKind,
    manifests_dir: Option<&Path>,
) -> Result<()> {
    let template = load_template(file, kind, manifests_dir)?;
    let json = template.to_json_pretty()?;
    match output {
        Some(out) => {
            std::fs::write(out, format!("{}\n", json)).map_err(|e| Error::io(out, e))?;
            log::info!("wrote {}", out.display());
            println!(
                "Wrote {} ({} resources, {})",
                out.display(),
                template.resources.len(),
                template.fingerprint()?
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_plan(
    file: &Path,
    params: &[String],
    kind: StackKind,
    manifests_dir: Option<&Path>,
) -> Result<()> {
    let template = load_template(file, kind, manifests_dir)?;
    let overrides = planner::parse_overrides(params)?;
    let plan = planner::plan(&template, &overrides)?;
    print_plan(&plan);
    Ok(())
}

/// Display a plan to stdout.
fn print_plan(plan: &types::DeploymentPlan) {
    println!("Planning: {} resources", plan.changes.len());
    println!();
    println!("Parameters:");
    for (name, value) in &plan.parameters {
        println!("  {} = {}", name, value);
    }
    println!();

    for change in &plan.changes {
        let symbol = match change.action {
            types::PlanAction::Provision => "+",
            types::PlanAction::Skip => " ",
        };
        println!(
            "  {} {:<9} {} ({})",
            symbol, change.action, change.path, change.resource_type
        );
    }

    if !plan.hazards.is_empty() {
        println!();
        println!("Hazards:");
        for (dependent, dependency) in &plan.hazards {
            println!("  ! {} depends on skipped {}", dependent, dependency);
        }
    }

    println!();
    println!(
        "Plan: {} to provision, {} to skip.",
        plan.to_provision, plan.to_skip
    );
}

fn cmd_policy(kind: PolicyKind, cluster_name: &str, ctx: &DeployContext) -> Result<()> {
    let identity = Identity::new(format!("{}-role", kind));
    let policy = kind.build(ctx, cluster_name, &identity);
    println!("{}", serde_json::to_string_pretty(&policy.document())?);
    Ok(())
}

fn cmd_schema() -> Result<()> {
    let schema = schemars::schema_for!(types::EksforgeConfig);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
