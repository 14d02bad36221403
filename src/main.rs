use clap::{Args, Parser, Subcommand};
use excel_query::cli::{self, ParseArgs};
use excel_query::error::QueryResult;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "excel-query")]
#[command(about = "Query spreadsheet rows as JSON records")]
#[command(long_about = "Excel Query - spreadsheet rows as JSON records

Columns can be addressed by letter (A..ZZ), by title text, or by any alias
configured for a title. Field names are derived from the titles:
'Student No' → studentNo, 'student_no' → studentNo.

COMMANDS:
  list    - Brief list of every row, projected onto chosen fields
  get     - One full record by key
  titles  - Show how titles and aliases map to columns
  sheets  - List sheet names, or check that a sheet exists

EXAMPLES:
  excel-query list students.xlsx --fields studentNo,name
  excel-query get students.xlsx --key-name studentNo --key S001
  excel-query titles students.xlsx --alias 'Student No|studentNo|学号'
  excel-query sheets students.xlsx --check Sheet2")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    parse: ParseFlags,

    #[command(subcommand)]
    command: Commands,
}

/// Header layout flags shared by every command
#[derive(Args)]
struct ParseFlags {
    /// YAML config file (aliases, title rows, invalid columns)
    #[arg(short, long, global = true, env = "EXCEL_QUERY_CONFIG")]
    config: Option<PathBuf>,

    /// Alias group, names separated by '|': 'Student No|studentNo|学号'
    #[arg(short, long = "alias", global = true)]
    aliases: Vec<String>,

    /// Number of header rows before the data
    #[arg(long, global = true)]
    title_rows: Option<usize>,

    /// 1-based header row holding the column titles
    #[arg(long, global = true)]
    title_row: Option<usize>,

    /// Leading columns to ignore (row-number gutters)
    #[arg(long, global = true)]
    invalid_cols: Option<usize>,
}

impl From<ParseFlags> for ParseArgs {
    fn from(flags: ParseFlags) -> Self {
        ParseArgs {
            config: flags.config,
            aliases: flags.aliases,
            title_row_count: flags.title_rows,
            title_row_index: flags.title_row,
            invalid_col_count: flags.invalid_cols,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Brief list of every row, projected onto chosen fields
    List {
        /// Path to the workbook
        workbook: PathBuf,

        /// Sheet name (default: first sheet)
        #[arg(short, long, default_value = "")]
        sheet: String,

        /// Comma-separated field list: studentNo,name
        #[arg(short, long)]
        fields: String,

        /// Key field remembered for later lookups
        #[arg(short, long, default_value = "")]
        key_name: String,

        /// Print only the JSON records
        #[arg(long)]
        json: bool,
    },

    /// One full record by key
    Get {
        /// Path to the workbook
        workbook: PathBuf,

        /// Sheet name (default: first sheet)
        #[arg(short, long, default_value = "")]
        sheet: String,

        /// Field to match: studentNo
        #[arg(short = 'n', long)]
        key_name: String,

        /// Value to match exactly
        #[arg(short, long)]
        key: String,

        /// Print only the JSON record (null when absent)
        #[arg(long)]
        json: bool,
    },

    /// Show how titles and aliases map to columns
    Titles {
        /// Path to the workbook
        workbook: PathBuf,

        /// Sheet name (default: first sheet)
        #[arg(short, long, default_value = "")]
        sheet: String,
    },

    /// List sheet names
    Sheets {
        /// Path to the workbook
        workbook: PathBuf,

        /// Only check that this sheet exists (exit code 1 when missing)
        #[arg(long)]
        check: Option<String>,
    },
}

fn main() -> QueryResult<()> {
    let cli = Cli::parse();
    let args = ParseArgs::from(cli.parse);

    match cli.command {
        Commands::List {
            workbook,
            sheet,
            fields,
            key_name,
            json,
        } => cli::list(workbook, sheet, fields, key_name, json, &args),

        Commands::Get {
            workbook,
            sheet,
            key_name,
            key,
            json,
        } => cli::get(workbook, sheet, key_name, key, json, &args),

        Commands::Titles { workbook, sheet } => cli::titles(workbook, sheet, &args),

        Commands::Sheets { workbook, check } => cli::sheets(workbook, check, &args),
    }
}
