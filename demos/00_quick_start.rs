/// quick start - one loan, one payment, one statement
use installment_billing::{
    BillingConfig, CollectionsService, Decimal, InMemoryStore, Money, NewCustomer, NewTransaction,
    PaymentCadence, PaymentRequest, SessionContext, TransactionKind, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let ctx = SessionContext::new(Uuid::new_v4(), "front-desk");
    let mut service = CollectionsService::new(InMemoryStore::new(), BillingConfig::default())?;

    let customer = service.create_customer(
        &ctx,
        NewCustomer {
            name: "Ana".to_string(),
            surname: "Pérez".to_string(),
            document: "30.111.222".to_string(),
            phone: Some("+54 11 5555 0000".to_string()),
            email: None,
            address: None,
        },
    )?;

    // a $1,000 loan at 20% flat, repaid in 6 monthly installments
    let created = service.create_transaction_now(
        &ctx,
        NewTransaction {
            customer_id: customer.id,
            product_id: None,
            kind: TransactionKind::Loan,
            amount: Some(Money::from_major(1_000)),
            interest_percentage: Decimal::from(20),
            cadence: PaymentCadence::Monthly,
            number_of_installments: 6,
            start_date: None,
            description: Some("working capital".to_string()),
            invoice_number: None,
        },
    )?;

    for line in &created.installments {
        println!("installment {} due {}: ${}", line.sequence_number, line.due_date, line.base_amount);
    }

    // pay the first installment
    let first = &created.installments[0];
    let receipt = service.register_payment(
        &ctx,
        PaymentRequest::new(first.id, Money::from_major(200), first.due_date),
    )?;
    println!("\nreceipt {} - still owed ${}", receipt.receipt_number, receipt.transaction_outstanding);

    let statement = service.customer_statement_now(&ctx, customer.id)?;
    println!("closing balance: ${}", statement.closing_balance);

    Ok(())
}
