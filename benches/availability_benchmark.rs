use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hotel_booking_client::availability::{eligible_room_types, min_availability, stay_dates};
use hotel_booking_client::models::{AvailabilityCalendar, AvailabilityEntry};
use rand::{thread_rng, Rng};

// Calendar of `room_types` room types over one year, roughly 5% of days sold out
fn random_calendar(room_types: usize) -> AvailabilityCalendar {
    let mut rng = thread_rng();
    let mut calendar = AvailabilityCalendar::new();
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

    for i in 0..room_types {
        let name = format!("room-type-{}", i);
        for day in start.iter_days().take(365) {
            let available = if rng.gen_bool(0.05) {
                0
            } else {
                rng.gen_range(1..20)
            };
            calendar.insert(
                &name,
                day,
                AvailabilityEntry {
                    available,
                    booked: 20 - available,
                },
            );
        }
    }
    calendar
}

pub fn eligibility_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("room_type_eligibility");
    let check_in = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

    for room_types in [10, 100, 1000].iter() {
        let calendar = random_calendar(*room_types);
        for stay_len in [3u64, 14] {
            let check_out = check_in
                .checked_add_days(chrono::Days::new(stay_len))
                .unwrap();
            let dates = stay_dates(check_in, check_out);
            group.bench_with_input(
                BenchmarkId::new(format!("{}_nights", stay_len), room_types),
                &calendar,
                |b, calendar| b.iter(|| eligible_room_types(black_box(calendar), black_box(&dates))),
            );
        }
    }

    group.finish();
}

pub fn min_availability_benchmark(c: &mut Criterion) {
    let calendar = random_calendar(100);
    let check_in = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let check_out = NaiveDate::from_ymd_opt(2025, 3, 29).unwrap();
    let dates = stay_dates(check_in, check_out);

    c.bench_function("min_availability_28_nights", |b| {
        b.iter(|| min_availability(black_box(&calendar), "room-type-42", black_box(&dates)))
    });
}

criterion_group!(benches, eligibility_benchmark, min_availability_benchmark);
criterion_main!(benches);
