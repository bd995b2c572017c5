use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{BillingError, Result};
use crate::events::Event;
use crate::records::{Customer, Transaction};
use crate::store::{delete_record, fetch_all, insert_record, save_record, Query, RecordStore};
use crate::types::{CustomerId, SessionContext};

use super::CollectionsService;

/// input for a new customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub surname: String,
    pub document: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// the editable part of a customer; the document is fixed at creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub surname: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// canonical form of a national id: separators dropped, upper case
pub fn normalize_document(document: &str) -> Result<String> {
    let trimmed = document.trim();
    if trimmed.is_empty() {
        return Err(BillingError::validation("document is required"));
    }
    if let Some(bad) = trimmed
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ' ')))
    {
        return Err(BillingError::validation(format!(
            "document '{}' contains '{}'",
            trimmed, bad
        )));
    }
    let normalized: String = trimmed
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if normalized.is_empty() {
        return Err(BillingError::validation("document is required"));
    }
    Ok(normalized)
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BillingError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl<S: RecordStore> CollectionsService<S> {
    pub fn create_customer(&mut self, ctx: &SessionContext, input: NewCustomer) -> Result<Customer> {
        let name = required("name", &input.name)?;
        let document = normalize_document(&input.document)?;

        let existing: Vec<Customer> = fetch_all(
            &self.store,
            &Query::new()
                .eq("organization_id", ctx.organization_id)
                .eq("document", &document)
                .limit(1),
        )?;
        if !existing.is_empty() {
            warn!(organization_id = %ctx.organization_id, document = %document, "duplicate customer document");
            return Err(BillingError::constraint(format!(
                "a customer with document {} already exists",
                document
            )));
        }

        let customer = Customer {
            id: Uuid::new_v4(),
            organization_id: ctx.organization_id,
            name,
            surname: input.surname.trim().to_string(),
            document,
            phone: optional(&input.phone),
            email: optional(&input.email),
            address: optional(&input.address),
        };
        let customer = insert_record(&mut self.store, &customer)?;

        info!(
            organization_id = %ctx.organization_id,
            customer_id = %customer.id,
            operator = %ctx.operator,
            "customer created"
        );
        self.events.emit(Event::CustomerCreated {
            organization_id: ctx.organization_id,
            customer_id: customer.id,
            document: customer.document.clone(),
        });

        Ok(customer)
    }

    pub fn customer(&self, ctx: &SessionContext, id: CustomerId) -> Result<Customer> {
        self.load_customer(ctx, id)
    }

    /// the organization's customers, by surname
    pub fn customers(&self, ctx: &SessionContext) -> Result<Vec<Customer>> {
        self.tenant_customers(ctx)
    }

    /// case-insensitive match on name, surname, document, phone or email
    pub fn search_customers(&self, ctx: &SessionContext, term: &str) -> Result<Vec<Customer>> {
        let needle = term.trim().to_lowercase();
        let customers = self.tenant_customers(ctx)?;
        if needle.is_empty() {
            return Ok(customers);
        }

        Ok(customers
            .into_iter()
            .filter(|c| {
                [
                    Some(c.name.as_str()),
                    Some(c.surname.as_str()),
                    Some(c.document.as_str()),
                    c.phone.as_deref(),
                    c.email.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect())
    }

    pub fn update_customer_contact(
        &mut self,
        ctx: &SessionContext,
        id: CustomerId,
        contact: CustomerContact,
    ) -> Result<Customer> {
        let mut customer = self.load_customer(ctx, id)?;

        customer.name = required("name", &contact.name)?;
        customer.surname = contact.surname.trim().to_string();
        customer.phone = optional(&contact.phone);
        customer.email = optional(&contact.email);
        customer.address = optional(&contact.address);
        save_record(&mut self.store, &customer)?;

        info!(customer_id = %customer.id, operator = %ctx.operator, "customer contact updated");
        Ok(customer)
    }

    /// delete a customer that has no transactions
    pub fn delete_customer(&mut self, ctx: &SessionContext, id: CustomerId) -> Result<()> {
        let customer = self.load_customer(ctx, id)?;

        let transactions: Vec<Transaction> =
            fetch_all(&self.store, &Query::new().eq("customer_id", customer.id))?;
        if !transactions.is_empty() {
            warn!(
                customer_id = %customer.id,
                transactions = transactions.len(),
                "refusing to delete customer with transactions"
            );
            return Err(BillingError::constraint(format!(
                "customer {} has {} transaction(s) and cannot be deleted",
                customer.full_name(),
                transactions.len()
            )));
        }

        delete_record::<Customer, _>(&mut self.store, customer.id)?;

        info!(customer_id = %customer.id, operator = %ctx.operator, "customer deleted");
        self.events.emit(Event::CustomerDeleted {
            organization_id: ctx.organization_id,
            customer_id: customer.id,
        });
        Ok(())
    }
}
