/// account statement - running balance over a sale and its payments
use chrono::{NaiveDate, TimeZone, Utc};
use installment_billing::service::NewProduct;
use installment_billing::{
    BillingConfig, CollectionsService, Decimal, InMemoryStore, Money, NewCustomer, NewTransaction,
    PaymentCadence, PaymentMethod, PaymentRequest, ProductCategory, SafeTimeProvider, SessionContext,
    TimeSource, TransactionKind, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap(),
    ));
    let ctx = SessionContext::new(Uuid::new_v4(), "sales");
    let mut service = CollectionsService::new(InMemoryStore::new(), BillingConfig::default())?;

    let customer = service.create_customer(
        &ctx,
        NewCustomer {
            name: "Diego".to_string(),
            surname: "Sosa".to_string(),
            document: "33222111".to_string(),
            phone: None,
            email: None,
            address: Some("Belgrano 1200".to_string()),
        },
    )?;
    let fridge = service.create_product(
        &ctx,
        NewProduct {
            name: "Fridge 300L".to_string(),
            description: None,
            unit_price: Money::from_major(300),
            category: ProductCategory::Appliance,
            stock: 4,
        },
    )?;

    let date = |d: u32| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
    let sale = service.create_transaction(
        &ctx,
        NewTransaction {
            customer_id: customer.id,
            product_id: Some(fridge.id),
            kind: TransactionKind::Sale,
            amount: None,
            interest_percentage: Decimal::ZERO,
            cadence: PaymentCadence::Weekly,
            number_of_installments: 3,
            start_date: Some(date(1)),
            description: None,
            invoice_number: Some("A-0001-00000042".to_string()),
        },
        &time,
    )?;

    service.register_payment(
        &ctx,
        PaymentRequest::new(sale.installments[0].id, Money::from_major(100), date(5)),
    )?;
    service.register_payment(
        &ctx,
        PaymentRequest::new(sale.installments[1].id, Money::from_major(100), date(10))
            .with_method(PaymentMethod::Transfer),
    )?;

    let statement = service.customer_statement(&ctx, customer.id, &time)?;
    println!("{:<12} {:<28} {:>10} {:>10} {:>10}", "date", "description", "debit", "credit", "balance");
    for entry in &statement.entries {
        println!(
            "{:<12} {:<28} {:>10} {:>10} {:>10}",
            entry.date.to_string(),
            entry.description,
            entry.debit.to_string(),
            entry.credit.to_string(),
            entry.balance.to_string()
        );
    }

    let inventory = service.inventory_summary(&ctx)?;
    println!("\nunits left: {} (value ${})", inventory.units_in_stock, inventory.stock_value);

    Ok(())
}
