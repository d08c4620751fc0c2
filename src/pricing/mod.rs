// Pure pricing calculator for settlements
//
// No side effects and no storage access: every input is passed in, so the
// arithmetic is independently testable.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Itemized pricing for one settlement attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    /// Coins actually redeemed: clamped to the wallet balance and to the
    /// pre-discount total, whichever is smaller
    pub discount_coins: i64,
    pub final_amount: Decimal,
}

/// Price a settlement
///
/// One coin is worth one currency unit. The discount is
/// `min(coins_requested, wallet_balance, floor(subtotal + shipping + tax))`:
/// coins are redeemed whole, cannot exceed the wallet's actual balance, and
/// cannot push the total below zero.
pub fn price(
    unit_price: Decimal,
    quantity: i32,
    coins_requested: i64,
    wallet_balance: i64,
    tax_rate: Decimal,
    shipping: Decimal,
) -> Quote {
    let subtotal = unit_price * Decimal::from(quantity);
    let tax = (subtotal * tax_rate).round_dp(2);
    let pretotal = subtotal + shipping + tax;

    let pretotal_cap = pretotal.floor().to_i64().unwrap_or(0).max(0);
    let discount_coins = coins_requested
        .max(0)
        .min(wallet_balance.max(0))
        .min(pretotal_cap);

    let final_amount = (pretotal - Decimal::from(discount_coins)).max(Decimal::ZERO);

    Quote {
        subtotal,
        shipping,
        tax,
        discount_coins,
        final_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_without_coins() {
        let quote = price(dec!(100), 2, 0, 500, dec!(0.18), dec!(50));
        assert_eq!(quote.subtotal, dec!(200));
        assert_eq!(quote.tax, dec!(36.00));
        assert_eq!(quote.shipping, dec!(50));
        assert_eq!(quote.discount_coins, 0);
        assert_eq!(quote.final_amount, dec!(286.00));
    }

    #[test]
    fn test_discount_clamped_to_wallet_balance() {
        // unitPrice=100, quantity=2, taxRate=0.18, shipping=50, balance=30,
        // coinsRequested=9999 -> discount 30, final 256
        let quote = price(dec!(100), 2, 9999, 30, dec!(0.18), dec!(50));
        assert_eq!(quote.subtotal, dec!(200));
        assert_eq!(quote.tax, dec!(36.00));
        assert_eq!(quote.shipping, dec!(50));
        assert_eq!(quote.discount_coins, 30);
        assert_eq!(quote.final_amount, dec!(256.00));
    }

    #[test]
    fn test_discount_clamped_to_pretotal() {
        // Wallet holds far more than the total; coins cannot push it negative
        let quote = price(dec!(10), 1, 5000, 5000, dec!(0), dec!(0));
        assert_eq!(quote.discount_coins, 10);
        assert_eq!(quote.final_amount, dec!(0));
    }

    #[test]
    fn test_fractional_pretotal_keeps_final_positive() {
        // pretotal 11.80: only 11 whole coins can be redeemed
        let quote = price(dec!(10), 1, 100, 100, dec!(0.18), dec!(0));
        assert_eq!(quote.tax, dec!(1.80));
        assert_eq!(quote.discount_coins, 11);
        assert_eq!(quote.final_amount, dec!(0.80));
    }

    #[test]
    fn test_negative_coin_request_treated_as_zero() {
        let quote = price(dec!(100), 1, -5, 30, dec!(0), dec!(0));
        assert_eq!(quote.discount_coins, 0);
        assert_eq!(quote.final_amount, dec!(100));
    }

    #[test]
    fn test_event_pricing_without_shipping() {
        let quote = price(dec!(250), 3, 0, 0, dec!(0.18), dec!(0));
        assert_eq!(quote.subtotal, dec!(750));
        assert_eq!(quote.tax, dec!(135.00));
        assert_eq!(quote.final_amount, dec!(885.00));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// Identical inputs always produce identical quotes
    #[test]
    fn prop_price_is_deterministic() {
        proptest!(|(
            price_cents in 1u32..=100_000u32,
            quantity in 1i32..=50,
            coins in 0i64..=10_000,
            balance in 0i64..=10_000,
        )| {
            let unit_price = Decimal::from(price_cents) / Decimal::from(100);
            let tax_rate = Decimal::new(18, 2);
            let shipping = Decimal::from(50);

            let a = price(unit_price, quantity, coins, balance, tax_rate, shipping);
            let b = price(unit_price, quantity, coins, balance, tax_rate, shipping);
            prop_assert_eq!(a, b);
        });
    }

    /// Discount never exceeds the request, the balance, or the pre-discount total
    #[test]
    fn prop_discount_bounded() {
        proptest!(|(
            price_cents in 1u32..=100_000u32,
            quantity in 1i32..=50,
            coins in 0i64..=100_000,
            balance in 0i64..=100_000,
        )| {
            let unit_price = Decimal::from(price_cents) / Decimal::from(100);
            let quote = price(unit_price, quantity, coins, balance, Decimal::new(18, 2), Decimal::from(50));
            let pretotal = quote.subtotal + quote.shipping + quote.tax;

            prop_assert!(quote.discount_coins <= coins);
            prop_assert!(quote.discount_coins <= balance);
            prop_assert!(Decimal::from(quote.discount_coins) <= pretotal);
        });
    }

    /// Final amount is never negative and never exceeds the pre-discount total
    #[test]
    fn prop_final_amount_bounded() {
        proptest!(|(
            price_cents in 1u32..=100_000u32,
            quantity in 1i32..=50,
            coins in 0i64..=100_000,
            balance in 0i64..=100_000,
        )| {
            let unit_price = Decimal::from(price_cents) / Decimal::from(100);
            let quote = price(unit_price, quantity, coins, balance, Decimal::new(18, 2), Decimal::from(50));
            let pretotal = quote.subtotal + quote.shipping + quote.tax;

            prop_assert!(quote.final_amount >= Decimal::ZERO);
            prop_assert!(quote.final_amount <= pretotal);
            // discount + final reassemble the pretotal
            prop_assert_eq!(quote.final_amount + Decimal::from(quote.discount_coins), pretotal);
        });
    }
}
