//! `hotelctl`: command-line front end for the hotel booking API.
//!
//! User-facing output uses writeln! to stdout; logs go to stderr.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};

use hotel_booking_client::booking_flow::{AvailabilityOutcome, BookingFlow};
use hotel_booking_client::dashboard::Dashboard;
use hotel_booking_client::models::{Actor, Booking, BookingStatus};
use hotel_booking_client::stores::{AuthStore, BookingStore, ReviewStore, RoomStore, UserStore};
use hotel_booking_client::telemetry::init_tracing;
use hotel_booking_client::{AvailabilityStore, BookingApi, ClientConfig};

const DEFAULT_SESSION_FILE: &str = ".hotelctl-session.json";

#[derive(Parser, Debug)]
#[command(name = "hotelctl")]
#[command(version, about = "Hotel booking client", long_about = None)]
struct Cli {
    /// API base URL (overrides HOTEL_API_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Where the login session is kept (overrides HOTEL_SESSION_FILE)
    #[arg(long)]
    session_file: Option<PathBuf>,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and remember the session
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "HOTEL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// List room types
    Rooms {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[arg(short, long, default_value = "")]
        search: String,
    },
    /// Show room types free for every night of a stay
    Availability {
        #[arg(long)]
        check_in: NaiveDate,
        #[arg(long)]
        check_out: NaiveDate,
    },
    /// Book a room type for a stay
    Book {
        #[arg(long)]
        check_in: NaiveDate,
        #[arg(long)]
        check_out: NaiveDate,
        /// Room type ID
        #[arg(short, long)]
        room: i64,
    },
    /// List your bookings
    MyBookings,
    /// Cancel one of your pending bookings
    Cancel {
        /// Booking ID
        id: i64,
    },
    /// Review a completed stay
    Review {
        /// Booking ID
        #[arg(short, long)]
        booking: i64,
        #[arg(short, long)]
        rating: u8,
        #[arg(short, long, default_value = "")]
        comment: String,
    },
    /// Administrator commands
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    /// List all bookings
    Bookings {
        /// pending, confirmed or cancelled
        #[arg(short, long)]
        status: Option<BookingStatus>,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Confirm a pending booking
    Confirm {
        /// Booking ID
        id: i64,
    },
    /// Revenue, occupancy and rating figures
    Dashboard,
}

struct App {
    api: BookingApi,
    auth: Arc<AuthStore>,
    rooms: Arc<RoomStore>,
    availability: Arc<AvailabilityStore>,
    bookings: Arc<BookingStore>,
    reviews: Arc<ReviewStore>,
    users: Arc<UserStore>,
}

impl App {
    fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let session_file = config
            .session_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE));
        let api = BookingApi::http(config).context("failed to build API client")?;
        let auth = Arc::new(AuthStore::new(api.clone(), Some(session_file)));
        auth.initialize().context("failed to restore session")?;

        Ok(Self {
            rooms: Arc::new(RoomStore::new(api.clone())),
            availability: Arc::new(AvailabilityStore::new(api.clone())),
            bookings: Arc::new(BookingStore::new(api.clone())),
            reviews: Arc::new(ReviewStore::new(api.clone())),
            users: Arc::new(UserStore::new(api.clone())),
            auth,
            api,
        })
    }

    fn flow(&self) -> BookingFlow {
        BookingFlow::new(
            self.rooms.clone(),
            self.availability.clone(),
            self.bookings.clone(),
            self.auth.clone(),
        )
    }
}

fn print_bookings(out: &mut impl Write, bookings: &[Booking]) -> io::Result<()> {
    if bookings.is_empty() {
        return writeln!(out, "No bookings found.");
    }
    writeln!(
        out,
        "{:>6}  {:<20}  {:<10}  {:<10}  {:>6}  {:>10}  STATUS",
        "ID", "ROOM", "CHECK-IN", "CHECK-OUT", "NIGHTS", "TOTAL"
    )?;
    for b in bookings {
        writeln!(
            out,
            "{:>6}  {:<20}  {:<10}  {:<10}  {:>6}  {:>10.2}  {}",
            b.id,
            b.room_type_name(),
            b.check_in.format("%Y-%m-%d"),
            b.check_out.format("%Y-%m-%d"),
            b.nights,
            b.total_price,
            b.status
        )?;
    }
    Ok(())
}

async fn run(app: &App, command: Command) -> anyhow::Result<()> {
    let mut out = io::stdout();
    match command {
        Command::Login { email, password } => {
            let user = app.auth.login(&email, &password).await?;
            writeln!(out, "Logged in as {} ({})", user.name, user.role)?;
        }
        Command::Logout => {
            app.auth.logout()?;
            writeln!(out, "Logged out.")?;
        }
        Command::Rooms { page, search } => {
            app.rooms.set_search(&search);
            app.rooms.set_page(page);
            app.rooms.fetch_rooms().await?;
            let state = app.rooms.snapshot();
            writeln!(out, "{:>4}  {:<24}  {:>8}  {:>4}", "ID", "TYPE", "PRICE", "QTY")?;
            for room in &state.rooms {
                writeln!(
                    out,
                    "{:>4}  {:<24}  {:>8.2}  {:>4}",
                    room.id, room.name, room.price, room.quantity
                )?;
            }
            writeln!(out, "Page {} of {}", state.query.page, state.total_pages())?;
        }
        Command::Availability {
            check_in,
            check_out,
        } => {
            let flow = app.flow();
            flow.set_check_in(check_in);
            flow.set_check_out(check_out);
            match flow.check_availability().await? {
                AvailabilityOutcome::NoRooms => {
                    writeln!(out, "No rooms available for the selected dates.")?
                }
                AvailabilityOutcome::Found(_) => {
                    for room in flow.snapshot().available_rooms {
                        writeln!(out, "{:>4}  {:<24}  {:>8.2}/night", room.id, room.name, room.price)?;
                    }
                }
            }
        }
        Command::Book {
            check_in,
            check_out,
            room,
        } => {
            app.auth.require_user()?;
            let flow = app.flow();
            flow.set_check_in(check_in);
            flow.set_check_out(check_out);
            if flow.check_availability().await? == AvailabilityOutcome::NoRooms {
                anyhow::bail!("No rooms available for the selected dates");
            }
            let selected = flow.select_room(room)?;
            writeln!(
                out,
                "{}: {} nights, {:.2} total ({} left on the busiest night)",
                selected.name,
                flow.nights().unwrap_or_default(),
                flow.total_price().unwrap_or_default(),
                flow.min_availability().unwrap_or_default()
            )?;
            let booking = flow.submit().await?;
            writeln!(out, "Booking #{} created, status {}", booking.id, booking.status)?;
        }
        Command::MyBookings => {
            app.auth.require_user()?;
            app.bookings.fetch_my_bookings().await?;
            print_bookings(&mut out, &app.bookings.snapshot().my_bookings)?;
        }
        Command::Cancel { id } => {
            app.auth.require_user()?;
            app.bookings.fetch_my_bookings().await?;
            let booking = app
                .bookings
                .update_booking_status(id, BookingStatus::Cancelled, Actor::Owner)
                .await?;
            writeln!(out, "Booking #{} is now {}", booking.id, booking.status)?;
        }
        Command::Review {
            booking,
            rating,
            comment,
        } => {
            app.auth.require_user()?;
            app.bookings.fetch_my_bookings().await?;
            let target = app
                .bookings
                .snapshot()
                .my_bookings
                .into_iter()
                .find(|b| b.id == booking)
                .with_context(|| format!("booking #{} not found", booking))?;
            let review = app
                .reviews
                .create_review(&target, rating, &comment, Utc::now())
                .await?;
            writeln!(out, "Review #{} submitted for {}", review.id, target.room_type_name())?;
        }
        Command::Admin { action } => {
            app.auth.require_admin()?;
            run_admin(app, action, &mut out).await?;
        }
    }
    Ok(())
}

async fn run_admin(app: &App, action: AdminAction, out: &mut impl Write) -> anyhow::Result<()> {
    match action {
        AdminAction::Bookings {
            status,
            page,
            search,
        } => {
            app.bookings.set_status_filter(status);
            app.bookings.set_search(&search);
            app.bookings.set_page(page);
            app.bookings.fetch_bookings().await?;
            let state = app.bookings.snapshot();
            print_bookings(out, &state.bookings)?;
            writeln!(out, "Page {} of {}", state.query.page, state.total_pages())?;
        }
        AdminAction::Confirm { id } => {
            app.bookings.get_booking_by_id(id).await?;
            let booking = app
                .bookings
                .update_booking_status(id, BookingStatus::Confirmed, Actor::Admin)
                .await?;
            writeln!(out, "Booking #{} is now {}", booking.id, booking.status)?;
        }
        AdminAction::Dashboard => {
            let dashboard = Dashboard::new(
                app.bookings.clone(),
                app.rooms.clone(),
                app.reviews.clone(),
                app.users.clone(),
            );
            let summary = dashboard.load().await?;
            writeln!(out, "Revenue (confirmed): {:.2}", summary.total_revenue)?;
            for entry in &summary.revenue_by_room_type {
                writeln!(out, "  {:<24} {:>10.2}", entry.room_type, entry.revenue)?;
            }
            writeln!(out, "Bookings:     {}", summary.total_bookings)?;
            writeln!(out, "Users:        {}", summary.total_users)?;
            writeln!(
                out,
                "Rooms:        {} across {} types",
                summary.total_rooms, summary.total_room_types
            )?;
            writeln!(
                out,
                "Reviews:      {} (average {:.1})",
                summary.total_reviews, summary.average_rating
            )?;
            for point in &summary.inventory {
                writeln!(out, "  {:<24} {:>4}", point.room_type, point.quantity)?;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing("hotel_booking_client=info,hotelctl=info", cli.json_logs);

    let mut config = ClientConfig::from_env().context("invalid configuration")?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
        config.validate()?;
    }
    if let Some(session_file) = cli.session_file {
        config.session_file = Some(session_file);
    }

    let app = App::new(config)?;
    let result = run(&app, cli.command).await;

    let stats = app.api.stats();
    tracing::debug!(
        sent = stats.requests_sent,
        failed = stats.requests_failed,
        "api client stats"
    );
    result
}
