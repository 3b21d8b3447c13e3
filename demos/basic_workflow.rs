//! Basic payables workflow example

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use kryzer_core::utils::MemoryStore;
use kryzer_core::{
    BankAccount, BankDirectory, FinanceManager, InstallmentPlan, NewObligation, ObligationKind,
    PartialSettlementRequest, SettlementRequest, StatementFilter,
};
use std::str::FromStr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("💼 Kryzer Core - Basic Workflow Example\n");

    // Set up a bank account and the manager
    let mut store = MemoryStore::new();
    store
        .save_bank(&BankAccount {
            id: "checking".to_string(),
            company_id: "demo-co".to_string(),
            name: "Conta Corrente".to_string(),
            initial_balance: BigDecimal::from_str("5000.00")?,
            overdraft_limit: BigDecimal::from_str("500.00")?,
        })
        .await?;
    let mut manager = FinanceManager::new(store);

    // 1. One-off payable
    println!("📋 Creating obligations...");
    let rent = manager
        .create_obligation(NewObligation {
            company_id: "demo-co".to_string(),
            kind: ObligationKind::Payable,
            description: "Office rent".to_string(),
            amount: BigDecimal::from_str("1200.00")?,
            due_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            bank_id: "checking".to_string(),
            category_id: "rent".to_string(),
            payment_method: Some("pix".to_string()),
            counterpart_id: None,
        })
        .await?;
    println!("  ✓ Payable: {} — R${}", rent.description, rent.amount);

    // 2. Installment purchase: 1000 split over 3 months
    let plan = InstallmentPlan::build(
        &BigDecimal::from_str("1000.00")?,
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        3,
    )?;
    let slices = manager
        .commit_installment_plan(
            NewObligation {
                company_id: "demo-co".to_string(),
                kind: ObligationKind::Payable,
                description: "Notebook".to_string(),
                amount: BigDecimal::from_str("1000.00")?,
                due_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
                bank_id: "checking".to_string(),
                category_id: "equipment".to_string(),
                payment_method: Some("boleto".to_string()),
                counterpart_id: None,
            },
            &plan,
        )
        .await?;
    for slice in &slices {
        let slot = slice.installment.as_ref().unwrap();
        println!(
            "  ✓ Installment {}/{}: R${} due {}",
            slot.number, slot.total, slice.amount, slice.due_date
        );
    }

    // 3. Pay the rent in full
    println!("\n💸 Settling the rent...");
    let event = manager
        .settle(SettlementRequest {
            company_id: "demo-co".to_string(),
            obligation_ids: vec![rent.id.clone()],
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            bank_id: "checking".to_string(),
            payment_method: Some("pix".to_string()),
            description: None,
            adjustments: None,
        })
        .await?;
    println!("  ✓ {} — R${}", event.description, event.amount);

    // 4. Pay half of the first installment slice
    println!("\n✂️  Partially settling the first installment...");
    let outcome = manager
        .partial_settle(PartialSettlementRequest {
            company_id: "demo-co".to_string(),
            obligation_id: slices[0].id.clone(),
            amount: BigDecimal::from_str("150.00")?,
            date: NaiveDate::from_ymd_opt(2024, 3, 16).unwrap(),
            bank_id: "checking".to_string(),
            payment_method: Some("pix".to_string()),
        })
        .await?;
    println!(
        "  ✓ Paid R${}, remainder R${} stays open",
        outcome.fragment.amount, outcome.remainder.amount
    );

    // 5. Bank position and statement
    let position = manager.bank_position("checking").await?;
    println!("\n🏦 Bank position:");
    println!("  Balance:   R${}", position.balance);
    println!("  Available: R${}", position.available);

    let statement = manager
        .statement(
            "demo-co",
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            &StatementFilter::default(),
        )
        .await?;
    println!("\n📈 Statement ({} days):", statement.days.len());
    for day in &statement.days {
        println!(
            "  {}: in R${} / out R${} / accumulated R${}",
            day.date, day.inflow, day.outflow, day.accumulated
        );
    }

    println!("\n🎉 Example completed successfully!");
    Ok(())
}
