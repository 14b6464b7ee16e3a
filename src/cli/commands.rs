use crate::config::SprintSettings;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "sprints")]
#[command(
    author,
    version,
    about = "Sprint lifecycle engine: plan, start and close sprints without losing unfinished work"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (searches upward for .sprints.toml by default)
    #[arg(long, global = true, env = "SPRINTS_CONFIG")]
    pub config: Option<String>,

    /// Path to data directory (overrides config)
    #[arg(long, global = true)]
    pub data_path: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write JSON logs to this file (rotated daily)
    #[arg(long, global = true)]
    pub log_file: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new sprints project
    Init {
        /// Default project reference for sprints and tasks
        #[arg(long, default_value_t = SprintSettings::default().project)]
        project: String,

        /// Prefix for sprint IDs
        #[arg(long, default_value_t = SprintSettings::default().sprint_prefix)]
        sprint_prefix: String,

        /// Prefix for task IDs
        #[arg(long, default_value_t = SprintSettings::default().task_prefix)]
        task_prefix: String,

        /// Length of random ID suffix
        #[arg(long, default_value_t = SprintSettings::default().id_length)]
        id_length: usize,

        /// Number IDs sequentially instead of randomly
        #[arg(long)]
        sequential: bool,

        /// Frontmatter format for new files
        #[arg(long, value_enum, default_value = "toml")]
        frontmatter: FrontmatterArg,
    },

    /// Manage sprints
    #[command(visible_alias = "s")]
    Sprint {
        #[command(subcommand)]
        action: SprintAction,
    },

    /// Manage tasks
    #[command(visible_alias = "t")]
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Execute a GraphQL query or mutation
    Query {
        /// GraphQL document
        query: String,

        /// Variables as JSON
        #[arg(long)]
        variables: Option<String>,
    },

    /// Start GraphQL HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,
    },
}

#[derive(Subcommand)]
pub enum SprintAction {
    /// Create a sprint in planning status
    #[command(visible_alias = "new")]
    Create {
        #[command(flatten)]
        spec: SprintSpecArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List sprints
    #[command(visible_alias = "ls")]
    List {
        /// Only sprints of this project
        #[arg(long)]
        project: Option<String>,

        /// Filter by status
        #[arg(short, long, value_enum)]
        status: Option<SprintStatusArg>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a sprint with its tasks and progress
    Show {
        /// Sprint ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start a planning sprint
    Start {
        /// Sprint ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Complete an active sprint and migrate unfinished tasks
    ///
    /// Unfinished tasks go to the backlog unless selected with --select, in
    /// which case they go to --target or to a new sprint (--new-*).
    Complete {
        /// Sprint ID
        id: String,

        /// Unfinished tasks to carry over (repeatable)
        #[arg(long = "select", value_name = "TASK_ID")]
        selected: Vec<String>,

        /// Existing planning or active sprint that receives the selected tasks
        #[arg(long, conflicts_with_all = ["new_sprint_name", "new_start", "new_auto_name"])]
        target: Option<String>,

        /// Name for a new sprint that receives the selected tasks
        #[arg(long)]
        new_sprint_name: Option<String>,

        /// Create the new sprint with the next "Sprint N" name
        #[arg(long, conflicts_with = "new_sprint_name")]
        new_auto_name: bool,

        /// Start date of the new sprint (defaults to the day after this sprint ends)
        #[arg(long, value_name = "YYYY-MM-DD")]
        new_start: Option<NaiveDate>,

        /// End date of the new sprint (defaults to the configured sprint length)
        #[arg(long, value_name = "YYYY-MM-DD")]
        new_end: Option<NaiveDate>,

        /// Capacity in hours of the new sprint
        #[arg(long)]
        new_capacity: Option<f64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Cancel a planning or active sprint
    Cancel {
        /// Sprint ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List unfinished tasks of a sprint
    Incomplete {
        /// Sprint ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move tasks out of a sprint, e.g. to retry failed migrations
    Migrate {
        /// Sprint the tasks are currently in
        from: String,

        /// Task IDs to move
        #[arg(required = true)]
        ids: Vec<String>,

        /// Destination sprint (backlog when omitted)
        #[arg(long)]
        to: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
pub struct SprintSpecArgs {
    /// Sprint name (auto-numbered when omitted)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Project reference (defaults to the configured project)
    #[arg(long)]
    pub project: Option<String>,

    /// Planned start date (defaults to today)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub start: Option<NaiveDate>,

    /// Planned end date (defaults to the configured sprint length)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub end: Option<NaiveDate>,

    /// Capacity in hours
    #[arg(short, long)]
    pub capacity: Option<f64>,

    /// Sprint goal
    #[arg(short, long)]
    pub goal: Option<String>,
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a task
    #[command(visible_alias = "new")]
    Create {
        /// Title of the task
        title: String,

        /// Project reference (defaults to the configured project)
        #[arg(long)]
        project: Option<String>,

        /// Sprint to put the task in
        #[arg(long)]
        sprint: Option<String>,

        /// Initial status
        #[arg(short, long)]
        status: Option<String>,

        /// Story points
        #[arg(long)]
        points: Option<u32>,

        /// Description
        #[arg(short = 'd', long)]
        description: Option<String>,

        /// Subtask titles (repeatable)
        #[arg(long)]
        subtask: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List tasks
    #[command(visible_alias = "ls")]
    List {
        /// Only tasks in this sprint
        #[arg(long, conflicts_with = "backlog")]
        sprint: Option<String>,

        /// Only tasks in no sprint
        #[arg(long)]
        backlog: bool,

        /// Include archived tasks
        #[arg(long)]
        archived: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a task
    Show {
        /// Task ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set a task's status
    Status {
        /// Task ID
        id: String,

        /// New status (done and completed count as finished)
        status: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Put a task into a planning or active sprint
    Assign {
        /// Task ID
        id: String,

        /// Sprint ID
        sprint: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Archive a task
    Archive {
        /// Task ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a subtask
    #[command(name = "subtask-add")]
    SubtaskAdd {
        /// Task ID
        id: String,

        /// Subtask title
        title: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set a subtask's status
    #[command(name = "subtask-status")]
    SubtaskStatus {
        /// Task ID
        id: String,

        /// Subtask position, starting at 1
        index: usize,

        /// New status
        status: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SprintStatusArg {
    Planning,
    Active,
    Completed,
    Cancelled,
}

impl From<SprintStatusArg> for crate::model::SprintStatus {
    fn from(arg: SprintStatusArg) -> Self {
        match arg {
            SprintStatusArg::Planning => crate::model::SprintStatus::Planning,
            SprintStatusArg::Active => crate::model::SprintStatus::Active,
            SprintStatusArg::Completed => crate::model::SprintStatus::Completed,
            SprintStatusArg::Cancelled => crate::model::SprintStatus::Cancelled,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FrontmatterArg {
    Toml,
    Yaml,
}

impl FrontmatterArg {
    pub fn as_str(self) -> &'static str {
        match self {
            FrontmatterArg::Toml => "toml",
            FrontmatterArg::Yaml => "yaml",
        }
    }
}
