/// json views - what the ui and document export receive
use chrono::{NaiveDate, TimeZone, Utc};
use installment_billing::{
    BillingConfig, CollectionsService, Decimal, InMemoryStore, Money, NewCustomer, NewTransaction,
    PaymentCadence, SafeTimeProvider, SessionContext, TimeSource, TransactionKind, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = BillingConfig::from_json(
        r#"{
            "collections": { "notification_window_days": 10 },
            "receipts": { "prefix": "RCB" },
            "utc_offset_minutes": -180
        }"#,
    )?;
    println!("configuration:\n{}\n", config.to_json()?);

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap(),
    ));
    let ctx = SessionContext::new(Uuid::new_v4(), "back-office");
    let mut service = CollectionsService::new(InMemoryStore::new(), config)?;

    let customer = service.create_customer(
        &ctx,
        NewCustomer {
            name: "Elena".to_string(),
            surname: "Ruiz".to_string(),
            document: "29888777".to_string(),
            phone: Some("+54 261 555 0199".to_string()),
            email: Some("elena@example.com".to_string()),
            address: None,
        },
    )?;
    service.create_transaction(
        &ctx,
        NewTransaction {
            customer_id: customer.id,
            product_id: None,
            kind: TransactionKind::Loan,
            amount: Some(Money::from_major(500)),
            interest_percentage: Decimal::from(10),
            cadence: PaymentCadence::Monthly,
            number_of_installments: 5,
            start_date: Some(NaiveDate::from_ymd_opt(2024, 4, 15).unwrap()),
            description: None,
            invoice_number: None,
        },
        &time,
    )?;

    for notice in service.notifications(&ctx, None, &time)? {
        println!("{}", notice.to_json_pretty()?);
    }

    let dashboard = service.dashboard(&ctx, &time)?;
    println!("\n{}", serde_json::to_string_pretty(&dashboard)?);

    Ok(())
}
