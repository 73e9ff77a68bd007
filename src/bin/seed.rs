use chrono::{Duration, Utc};
use clap::Parser;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use rand::seq::SliceRandom;
use sqlx::sqlite::SqlitePoolOptions;

use tutelage::{
    domain::{AccountRole, CreateAccountRequest, CreateBookingRequest},
    repository::{
        AccountRepository, BookingRepository, SqliteAccountRepository, SqliteBookingRepository,
    },
};

#[derive(Parser)]
#[command(name = "seed", about = "Populate a development database with demo data")]
struct Args {
    /// Database to seed
    #[arg(long, default_value = "sqlite://tutelage.db")]
    database_url: String,

    /// Number of random tutees (each gets a handful of bookings)
    #[arg(long, default_value_t = 3)]
    tutees: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&args.database_url)
        .await?;

    // Run migrations first
    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let account_repo = SqliteAccountRepository::new(db_pool.clone());
    let booking_repo = SqliteBookingRepository::new(db_pool.clone());

    println!("👥 Creating accounts...");

    let tutor = account_repo
        .create(CreateAccountRequest {
            email: "tutor@tutelage.local".to_string(),
            full_name: "Pat Tutor".to_string(),
            password: "tutor123".to_string(),
            role: AccountRole::Tutor,
        })
        .await?;

    println!("  ✅ Created tutor account (tutor@tutelage.local / tutor123)");

    let event_types = ["Regular Tutoring", "Regular Tutoring", "SAT Prep", "ACT Prep"];
    let durations: [i64; 4] = [60, 90, 120, 45];
    let mut rng = rand::thread_rng();

    println!("📚 Creating tutees and bookings...");

    for i in 0..args.tutees {
        let name: String = Name().fake();
        let email: String = SafeEmail().fake();

        account_repo
            .create(CreateAccountRequest {
                email: email.clone(),
                full_name: name.clone(),
                password: "password123".to_string(),
                role: AccountRole::Tutee,
            })
            .await?;

        let booking_count = 1 + i % 3;
        for j in 0..booking_count {
            let event_type = *event_types.choose(&mut rng).unwrap();
            let duration = *durations.choose(&mut rng).unwrap();
            let start_time = Utc::now() + Duration::days((i * 7 + j) as i64 + 1);

            booking_repo
                .create(CreateBookingRequest {
                    cal_booking_id: format!("seed-{}-{}", i, j),
                    start_time,
                    duration_minutes: duration,
                    event_type: event_type.to_string(),
                    organizer_name: tutor.full_name.clone(),
                    organizer_email: tutor.email.clone(),
                    organizer_timezone: Some("America/New_York".to_string()),
                    attendee_name: name.clone(),
                    attendee_email: email.clone(),
                    attendee_timezone: Some("America/Chicago".to_string()),
                    billing_email: None,
                })
                .await?;
        }

        println!("  ✅ {} <{}> with {} booking(s)", name, email, booking_count);
    }

    println!("🎉 Seeding complete.");

    Ok(())
}
