use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;

use jira_remote::config::Config;
use jira_remote::jira::types::{CustomFieldFetchOptions, ProjectComponentCreationInfo};
use jira_remote::{logging, Jira};

#[derive(Parser, Debug)]
#[command(name = "jira-remote")]
#[command(about = "Query and manage Jira custom fields, components and remote links")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/jira-remote/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Jira project key to use when a command needs one
  #[arg(short, long)]
  project: Option<String>,

  /// Log every request and response (needs -vv or RUST_LOG=debug to show)
  #[arg(long)]
  trace_requests: bool,

  /// Increase log verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List custom fields, optionally limited to a project and issue type
  Fields {
    /// Issue type id (requires a project)
    #[arg(short = 't', long)]
    issue_type: Option<String>,
  },
  /// List the issue types of the project
  IssueTypes,
  /// List the components of the project
  Components,
  /// Create a component in the project
  CreateComponent {
    name: String,
    #[arg(short, long)]
    description: Option<String>,
    /// User name of the component lead
    #[arg(short, long)]
    lead: Option<String>,
  },
  /// Delete a component
  DeleteComponent {
    id: String,
    /// Component id that receives the deleted component's issues
    #[arg(long)]
    move_issues_to: Option<String>,
  },
  /// List the remote links of an issue
  RemoteLinks { issue: String },
  /// Add a remote link to an issue
  AddRemoteLink {
    issue: String,
    #[arg(long)]
    url: String,
    #[arg(long)]
    title: String,
    #[arg(long)]
    summary: Option<String>,
  },
  /// Download a file, such as an attachment's content url
  Download {
    /// Server-relative path or absolute url
    url: String,
    /// File to write
    #[arg(short, long)]
    output: PathBuf,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = Config::load(args.config.as_deref())?;
  if let Some(project) = args.project {
    config.default_project = Some(project);
  }
  if args.trace_requests {
    config.jira.enable_request_trace = true;
  }

  let _log_guard = logging::init(args.verbose, config.log_file.as_deref())?;

  let jira = Jira::new(&config)?;
  run(&jira, &config, args.command).await
}

async fn run(jira: &Jira, config: &Config, command: Command) -> Result<()> {
  let project = || {
    config
      .default_project
      .clone()
      .ok_or_else(|| eyre!("No project given. Use --project or set default_project."))
  };

  match command {
    Command::Fields { issue_type } => {
      let options = CustomFieldFetchOptions {
        project_key: config.default_project.clone(),
        issue_type_id: issue_type,
      };
      for field in jira.fields().get_custom_fields_with(&options).await? {
        let field_type = field.schema.map(|s| s.field_type).unwrap_or_default();
        println!("{}\t{}\t{}", field.id, field.name, field_type);
      }
    }
    Command::IssueTypes => {
      for issue_type in jira.issue_types().get_for_project(&project()?).await? {
        let kind = if issue_type.subtask { "subtask" } else { "standard" };
        println!("{}\t{}\t{}", issue_type.id, issue_type.name, kind);
      }
    }
    Command::Components => {
      for component in jira.components().get_for_project(&project()?).await? {
        println!(
          "{}\t{}\t{}",
          component.id,
          component.name,
          component.lead.unwrap_or_default()
        );
      }
    }
    Command::CreateComponent {
      name,
      description,
      lead,
    } => {
      let mut info = ProjectComponentCreationInfo::new(name, project()?);
      info.description = description;
      info.lead_user_name = lead;
      let component = jira.components().create(&info).await?;
      println!("Created component {} ({})", component.name, component.id);
    }
    Command::DeleteComponent { id, move_issues_to } => {
      jira
        .components()
        .delete(&id, move_issues_to.as_deref())
        .await?;
      println!("Deleted component {}", id);
    }
    Command::RemoteLinks { issue } => {
      for link in jira.remote_links().list(&issue).await? {
        println!(
          "{}\t{}\t{}",
          link.url,
          link.title.unwrap_or_default(),
          link.summary.unwrap_or_default()
        );
      }
    }
    Command::AddRemoteLink {
      issue,
      url,
      title,
      summary,
    } => {
      jira
        .remote_links()
        .create(&issue, &url, &title, summary.as_deref())
        .await?;
      println!("Linked {} to {}", issue, url);
    }
    Command::Download { url, output } => {
      jira.rest_client().download_to(&url, &output).await?;
      println!("Saved {} to {}", url, output.display());
    }
  }

  Ok(())
}
