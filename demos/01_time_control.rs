/// time control - walking a loan through overdue with a test clock
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use installment_billing::{
    BillingConfig, CollectionsService, Decimal, InMemoryStore, Money, NewCustomer, NewTransaction,
    PaymentCadence, SafeTimeProvider, SessionContext, TimeSource, TransactionKind, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== time control example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    // the business runs at UTC-3
    let config = BillingConfig::default().with_utc_offset_hours(-3);
    let mut service = CollectionsService::new(InMemoryStore::new(), config)?;
    let ctx = SessionContext::new(Uuid::new_v4(), "collections");

    let customer = service.create_customer(
        &ctx,
        NewCustomer {
            name: "Bruno".to_string(),
            surname: "Gómez".to_string(),
            document: "40999888".to_string(),
            phone: Some("+54 351 555 0101".to_string()),
            email: None,
            address: None,
        },
    )?;
    service.create_transaction(
        &ctx,
        NewTransaction {
            customer_id: customer.id,
            product_id: None,
            kind: TransactionKind::Loan,
            amount: Some(Money::from_major(600)),
            interest_percentage: Decimal::ZERO,
            cadence: PaymentCadence::Biweekly,
            number_of_installments: 4,
            start_date: Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            description: None,
            invoice_number: None,
        },
        &time,
    )?;

    for _ in 0..4 {
        controller.advance(Duration::days(10));
        let today = service.today(&time);
        println!("-- {} --", today);

        for notice in service.notifications(&ctx, Some(7), &time)? {
            println!(
                "  #{} due {} ({:?}, {} days): ${}",
                notice.sequence_number, notice.due_date, notice.classification, notice.days_until, notice.remaining
            );
        }

        let changed = service.refresh_statuses(&ctx, &time)?;
        if changed > 0 {
            println!("  {} transaction(s) changed status", changed);
        }
    }

    Ok(())
}
