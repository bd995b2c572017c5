/// rescheduling - suggest arrears interest, move the due date, settle
use chrono::{TimeZone, Utc};
use installment_billing::{
    BillingConfig, CollectionsService, Decimal, InMemoryStore, Money, NewCustomer, NewTransaction,
    PaymentCadence, PaymentRequest, RescheduleRequest, SafeTimeProvider, SessionContext, TimeSource,
    TransactionKind, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 4, 15, 15, 0, 0).unwrap(),
    ));
    let ctx = SessionContext::new(Uuid::new_v4(), "collections");
    let mut service = CollectionsService::new(InMemoryStore::new(), BillingConfig::default())?;

    let customer = service.create_customer(
        &ctx,
        NewCustomer {
            name: "Carla".to_string(),
            surname: "Díaz".to_string(),
            document: "27555444".to_string(),
            phone: None,
            email: Some("carla@example.com".to_string()),
            address: None,
        },
    )?;
    let created = service.create_transaction(
        &ctx,
        NewTransaction {
            customer_id: customer.id,
            product_id: None,
            kind: TransactionKind::Loan,
            amount: Some(Money::from_major(300)),
            interest_percentage: Decimal::ZERO,
            cadence: PaymentCadence::Monthly,
            number_of_installments: 3,
            start_date: Some(chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            description: None,
            invoice_number: None,
        },
        &time,
    )?;
    let first = created.installments[0].clone();

    let suggestion = service.suggest_interest(&ctx, first.id, &time)?;
    println!(
        "installment #1 is {} days late; suggested interest ${} ({} block(s) at {})",
        suggestion.days_overdue, suggestion.interest, suggestion.blocks_charged, suggestion.rate_per_block
    );

    let outcome = service.reschedule_installment(
        &ctx,
        first.id,
        RescheduleRequest::to(chrono::NaiveDate::from_ymd_opt(2024, 4, 30).unwrap())
            .with_interest(suggestion.interest)
            .with_reason("agreed with customer by phone"),
        &time,
    )?;
    println!("moved from {} to {}; now owes ${}", outcome.previous_due_date, outcome.installment.due_date, outcome.owed);

    let receipt = service.register_payment(
        &ctx,
        PaymentRequest::new(first.id, outcome.owed, outcome.installment.due_date),
    )?;
    println!("{}", receipt.to_json_pretty()?);

    Ok(())
}
