//! Debt negotiation example: merging overdue bills into a new plan

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use kryzer_core::utils::MemoryStore;
use kryzer_core::{
    BankAccount, BankDirectory, FinanceManager, NegotiationAdjustment, NegotiationMode,
    NegotiationRequest, NewObligation, ObligationKind, OriginsPlacement,
};
use std::str::FromStr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🤝 Kryzer Core - Debt Negotiation Example\n");

    let mut store = MemoryStore::new();
    store
        .save_bank(&BankAccount {
            id: "checking".to_string(),
            company_id: "demo-co".to_string(),
            name: "Conta Corrente".to_string(),
            initial_balance: BigDecimal::from_str("100.00")?,
            overdraft_limit: BigDecimal::from_str("0.00")?,
        })
        .await?;
    let mut manager = FinanceManager::new(store);

    // Three overdue utility bills
    println!("📋 Creating overdue bills...");
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let mut overdue_ids = Vec::new();
    for (desc, amount) in [("Electricity", "420.00"), ("Water", "180.00"), ("Phone", "300.00")] {
        let o = manager
            .create_obligation(NewObligation {
                company_id: "demo-co".to_string(),
                kind: ObligationKind::Payable,
                description: desc.to_string(),
                amount: BigDecimal::from_str(amount)?,
                due_date: NaiveDate::from_ymd_opt(2024, 4, 10).unwrap(),
                bank_id: "checking".to_string(),
                category_id: "utilities".to_string(),
                payment_method: Some("boleto".to_string()),
                counterpart_id: None,
            })
            .await?;
        println!("  ✓ {} — R${} (overdue)", o.description, o.amount);
        overdue_ids.push(o.id);
    }

    let before = manager
        .overdue_obligations("demo-co", ObligationKind::Payable, today)
        .await?;
    println!("\n⚠️  Overdue obligations: {}", before.len());

    // Negotiate: 15% discount, paid over 4 monthly installments
    println!("\n🤝 Negotiating: 15% discount over 4 installments...");
    let slices = manager
        .negotiate(NegotiationRequest {
            company_id: "demo-co".to_string(),
            obligation_ids: overdue_ids,
            adjustment: NegotiationAdjustment::Discount(BigDecimal::from(15)),
            mode: NegotiationMode::Installments(4),
            start_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            today,
            bank_id: None,
            category_id: None,
            payment_method: None,
            description: Some("Utility debt renegotiation".to_string()),
            origins_placement: OriginsPlacement::FirstSliceOnly,
        })
        .await?;

    // 900 * 0.85 = 765 over 4 slices
    for slice in &slices {
        let slot = slice.installment.as_ref().unwrap();
        println!(
            "  ✓ Slice {}/{}: R${} due {}",
            slot.number, slot.total, slice.amount, slice.due_date
        );
    }

    println!("\n📜 Origins recorded on the first slice:");
    for origin in &slices[0].negotiation_origins {
        println!(
            "  - {} — R${} (was due {})",
            origin.description, origin.amount, origin.due_date
        );
    }

    let after = manager
        .overdue_obligations("demo-co", ObligationKind::Payable, today)
        .await?;
    println!("\n⚠️  Overdue obligations after negotiation: {}", after.len());

    println!("\n🎉 Example completed successfully!");
    Ok(())
}
