use std::fmt;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use estate_sheets::briefing;
use estate_sheets::config::Config;
use estate_sheets::filter::ListingFilter;
use estate_sheets::io::backend::SheetsClient;
use estate_sheets::io::maps::{DEFAULT_ZOOM, MapClient, StaticMap};
use estate_sheets::model::{CellValue, ListingRow, SheetKind};
use estate_sheets::normalize;
use estate_sheets::session::SessionContext;
use estate_sheets::sync::{self, OpReport};
use estate_sheets::{Result, SheetError};

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_tracing()?;
    let config = Config::from_env()?;
    let mut session = SessionContext::new(config.cache_ttl);
    let mut client = SheetsClient::new(config.backend.clone());

    match cli.command {
        Command::List(args) => list(&mut session, &client, args),
        Command::Show(args) => show(&mut session, &client, &config, args),
        Command::Add(args) => add(&mut client, args),
        Command::Move(args) => {
            session.set_current(args.from.into());
            let ids = resolve_ids(&mut session, &client, args.from.into(), &args.rows)?;
            print_report(&session.move_to(&mut client, &ids, args.to.into()));
            Ok(())
        }
        Command::Copy(args) => {
            session.set_current(args.from.into());
            let ids = resolve_ids(&mut session, &client, args.from.into(), &args.rows)?;
            print_report(&session.copy_to(&mut client, &ids, args.to.into()));
            Ok(())
        }
        Command::Delete(args) => {
            session.set_current(args.sheet.into());
            let ids = resolve_ids(&mut session, &client, args.sheet.into(), &args.rows)?;
            print_report(&session.delete(&mut client, &ids));
            Ok(())
        }
        Command::Restore(args) => {
            session.set_current(args.from.into());
            let ids = resolve_ids(&mut session, &client, args.from.into(), &args.rows)?;
            print_report(&session.restore(&mut client, &ids));
            Ok(())
        }
        Command::Briefing(args) => print_briefing(&mut session, &client, args),
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| SheetError::Logging(error.to_string()))
}

fn list(session: &mut SessionContext, client: &SheetsClient, args: ListArgs) -> Result<()> {
    let sheet: SheetKind = args.sheet.into();
    session.set_current(sheet);
    session.set_filter(args.to_filter());

    let filter = session.filter().clone();
    let table = session.table(client, sheet)?;
    let indices = filter.visible_indices(table);

    let per_page = args.per_page.max(1);
    let pages = indices.len().div_ceil(per_page).max(1);
    let page = args.page.clamp(1, pages);

    println!(
        "{sheet} — page {page}/{pages}, {} matching listing(s)",
        indices.len()
    );
    for &index in indices.iter().skip((page - 1) * per_page).take(per_page) {
        println!("{:>4}. {}", index + 1, summary_line(&table.rows[index]));
    }
    Ok(())
}

fn show(
    session: &mut SessionContext,
    client: &SheetsClient,
    config: &Config,
    args: ShowArgs,
) -> Result<()> {
    let sheet: SheetKind = args.sheet.into();
    let table = session.table(client, sheet)?;
    let index = args
        .row
        .checked_sub(1)
        .ok_or(SheetError::RowOutOfRange(args.row))?;
    let row = table
        .rows
        .get(index)
        .ok_or(SheetError::RowOutOfRange(args.row))?;

    println!("{sheet} #{}", args.row);
    for column in &table.columns {
        let value = row.display(column);
        if !value.is_empty() {
            println!("{column}: {value}");
        }
    }

    if args.briefing {
        println!();
        print!("{}", briefing::listing_block(1, row));
    }

    if args.locate {
        let maps = MapClient::new(config.maps.clone());
        let coordinates = maps.geocode(&row.address())?;
        let map = StaticMap::new(coordinates, args.zoom, args.width, args.height);
        println!("지도: {}", maps.static_map_url(&map));
    }
    Ok(())
}

fn add(client: &mut SheetsClient, args: AddArgs) -> Result<()> {
    let mut row = ListingRow::new();
    for field in &args.set {
        let (column, value) = field
            .split_once('=')
            .ok_or_else(|| SheetError::InvalidField(field.clone()))?;
        let value = CellValue::from_field(value);
        if value.is_empty() {
            continue;
        }
        let column = normalize::normalize_headers(&[column.trim().to_string()])
            .into_iter()
            .next()
            .unwrap_or_else(|| column.trim().to_string());
        row.set(column, value);
    }

    let report = match sync::append_listing(client, args.sheet.into(), &row) {
        Ok(report) => report,
        Err(error) => OpReport::failure(&error),
    };
    print_report(&report);
    Ok(())
}

fn print_briefing(
    session: &mut SessionContext,
    client: &SheetsClient,
    args: BriefingArgs,
) -> Result<()> {
    let sheet: SheetKind = args.sheet.into();
    let table = session.table(client, sheet)?;

    let rows: Vec<ListingRow> = if args.rows.is_empty() {
        table.rows.clone()
    } else {
        let mut selected = Vec::with_capacity(args.rows.len());
        for &ordinal in &args.rows {
            let index = ordinal
                .checked_sub(1)
                .ok_or(SheetError::RowOutOfRange(ordinal))?;
            let row = table
                .rows
                .get(index)
                .ok_or(SheetError::RowOutOfRange(ordinal))?;
            selected.push(row.clone());
        }
        selected
    };

    print!("{}", briefing::briefing_text(sheet.name(), &rows));
    Ok(())
}

fn resolve_ids(
    session: &mut SessionContext,
    client: &SheetsClient,
    sheet: SheetKind,
    ordinals: &[usize],
) -> Result<Vec<Uuid>> {
    let table = session.table(client, sheet)?;
    let mut ids = Vec::with_capacity(ordinals.len());
    for &ordinal in ordinals {
        let index = ordinal
            .checked_sub(1)
            .ok_or(SheetError::RowOutOfRange(ordinal))?;
        let row = table
            .rows
            .get(index)
            .ok_or(SheetError::RowOutOfRange(ordinal))?;
        ids.push(row.id);
    }
    Ok(ids)
}

fn summary_line(row: &ListingRow) -> String {
    let mut parts = Vec::new();

    let address = row.address();
    if !address.is_empty() {
        parts.push(address);
    }
    let floor = row.display(normalize::FLOOR);
    if !floor.is_empty() {
        parts.push(format!("{floor}층"));
    }
    if let Some(area) = row.numeric(normalize::AREA) {
        parts.push(format!("{area}㎡"));
    }
    for (column, label) in [
        (normalize::DEPOSIT, "보증금"),
        (normalize::RENT, "월차임"),
        (normalize::PRICE, "매매가"),
    ] {
        if let Some(value) = row.numeric(column) {
            parts.push(format!("{label} {value}"));
        }
    }
    parts.join(" / ")
}

fn print_report(report: &OpReport) {
    if report.success {
        println!("ok: {}", report.message);
    } else {
        println!("failed: {}", report.message);
    }
}

#[derive(Parser)]
#[command(author, version, about = "Manage the shared real-estate listing sheets.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the listings of a sheet with optional filters.
    List(ListArgs),
    /// Show one listing in full, optionally with its map position.
    Show(ShowArgs),
    /// Add a new listing to a sheet.
    Add(AddArgs),
    /// Move selected rows to another sheet.
    Move(MoveArgs),
    /// Copy selected rows to another sheet.
    Copy(CopyArgs),
    /// Delete selected rows from a sheet.
    Delete(DeleteArgs),
    /// Restore selected rows from a closed archive to its active sheet.
    Restore(RestoreArgs),
    /// Print the text briefing for a sheet.
    Briefing(BriefingArgs),
}

#[derive(clap::Args)]
struct ListArgs {
    /// Sheet to list.
    #[arg(long, value_enum, default_value_t = SheetArg::Rental)]
    sheet: SheetArg,

    /// Substring filter on the district column.
    #[arg(long)]
    district: Option<String>,

    /// Upper bound on the deposit.
    #[arg(long)]
    max_deposit: Option<f64>,

    /// Upper bound on the monthly rent.
    #[arg(long)]
    max_rent: Option<f64>,

    /// Upper bound on the sale price.
    #[arg(long)]
    max_price: Option<f64>,

    /// Lower bound on the floor area.
    #[arg(long)]
    min_area: Option<f64>,

    /// Free-text query over every column.
    #[arg(long)]
    query: Option<String>,

    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    page: usize,

    #[arg(long, default_value_t = 20)]
    per_page: usize,
}

impl ListArgs {
    fn to_filter(&self) -> ListingFilter {
        ListingFilter {
            district: self.district.clone(),
            max_deposit: self.max_deposit,
            max_rent: self.max_rent,
            max_price: self.max_price,
            min_area: self.min_area,
            query: self.query.clone(),
        }
    }
}

#[derive(clap::Args)]
struct ShowArgs {
    /// Sheet holding the listing.
    #[arg(long, value_enum, default_value_t = SheetArg::Rental)]
    sheet: SheetArg,

    /// 1-based row number within the sheet.
    #[arg(long)]
    row: usize,

    /// Print the briefing text block for this listing.
    #[arg(long)]
    briefing: bool,

    /// Geocode the address and print the static map URL.
    #[arg(long)]
    locate: bool,

    /// Static map zoom level.
    #[arg(long, default_value_t = DEFAULT_ZOOM)]
    zoom: u8,

    /// Static map width in pixels.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Static map height in pixels; the service cap still applies.
    #[arg(long, default_value_t = 480)]
    height: u32,
}

#[derive(clap::Args)]
struct AddArgs {
    /// Sheet to add the listing to.
    #[arg(long, value_enum, default_value_t = SheetArg::Rental)]
    sheet: SheetArg,

    /// Listing fields as column=value pairs; repeat for each column.
    #[arg(long, required = true)]
    set: Vec<String>,
}

#[derive(clap::Args)]
struct MoveArgs {
    /// Source sheet.
    #[arg(long, value_enum)]
    from: SheetArg,

    /// Destination sheet.
    #[arg(long, value_enum)]
    to: SheetArg,

    /// 1-based row numbers within the source sheet.
    #[arg(long, value_delimiter = ',', required = true)]
    rows: Vec<usize>,
}

#[derive(clap::Args)]
struct CopyArgs {
    /// Source sheet.
    #[arg(long, value_enum)]
    from: SheetArg,

    /// Destination sheet.
    #[arg(long, value_enum)]
    to: SheetArg,

    /// 1-based row numbers within the source sheet.
    #[arg(long, value_delimiter = ',', required = true)]
    rows: Vec<usize>,
}

#[derive(clap::Args)]
struct DeleteArgs {
    /// Sheet to delete from.
    #[arg(long, value_enum)]
    sheet: SheetArg,

    /// 1-based row numbers within the sheet.
    #[arg(long, value_delimiter = ',', required = true)]
    rows: Vec<usize>,
}

#[derive(clap::Args)]
struct RestoreArgs {
    /// Closed archive to restore from.
    #[arg(long, value_enum)]
    from: SheetArg,

    /// 1-based row numbers within the archive.
    #[arg(long, value_delimiter = ',', required = true)]
    rows: Vec<usize>,
}

#[derive(clap::Args)]
struct BriefingArgs {
    /// Sheet to render the briefing from.
    #[arg(long, value_enum, default_value_t = SheetArg::RentalBriefing)]
    sheet: SheetArg,

    /// Optional 1-based row numbers; the whole sheet when omitted.
    #[arg(long, value_delimiter = ',')]
    rows: Vec<usize>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SheetArg {
    Rental,
    Sale,
    RentalClosed,
    SaleClosed,
    RentalBriefing,
    SaleBriefing,
}

impl fmt::Display for SheetArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetArg::Rental => write!(f, "rental"),
            SheetArg::Sale => write!(f, "sale"),
            SheetArg::RentalClosed => write!(f, "rental-closed"),
            SheetArg::SaleClosed => write!(f, "sale-closed"),
            SheetArg::RentalBriefing => write!(f, "rental-briefing"),
            SheetArg::SaleBriefing => write!(f, "sale-briefing"),
        }
    }
}

impl From<SheetArg> for SheetKind {
    fn from(sheet: SheetArg) -> Self {
        match sheet {
            SheetArg::Rental => SheetKind::Rental,
            SheetArg::Sale => SheetKind::Sale,
            SheetArg::RentalClosed => SheetKind::RentalClosed,
            SheetArg::SaleClosed => SheetKind::SaleClosed,
            SheetArg::RentalBriefing => SheetKind::RentalBriefing,
            SheetArg::SaleBriefing => SheetKind::SaleBriefing,
        }
    }
}
