//! Pari-mutuel payout calculation.
//!
//! [`calculate_payouts`] is the settlement core: pure, deterministic, and
//! integer-exact. Given every wager on a market and the winning option, it
//! produces one payout per wager such that the payouts sum to the prize
//! pool exactly — coins are conserved, whatever the rounding.

use serde::Serialize;

use super::id::{AgentId, OptionId, WagerId};
use super::wager::Wager;

/// One wager's computed payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayoutAward {
    pub wager_id: WagerId,
    pub agent_id: AgentId,
    pub amount: i64,
}

/// Compute per-wager payouts for a resolved market.
///
/// - The prize pool is the sum of all stakes.
/// - Winners (wagers on `winning_option`) each receive
///   `floor(stake * pool / winning_stake)`; the remainder left by flooring
///   is handed out one coin at a time to winners in descending-stake order,
///   equal stakes keeping their original relative order (stable sort).
/// - Losers receive 0.
/// - If nothing was staked on the winning option, every wager is refunded
///   its own stake: the pool cannot be redistributed fairly, and refunding
///   keeps the conservation invariant.
///
/// The output covers every input wager exactly once and always satisfies
/// `sum(amount) == prize pool`.
#[must_use]
pub fn calculate_payouts(wagers: &[Wager], winning_option: &OptionId) -> Vec<PayoutAward> {
    let prize_pool: i64 = wagers.iter().map(|w| w.amount).sum();
    let (winners, losers): (Vec<&Wager>, Vec<&Wager>) =
        wagers.iter().partition(|w| &w.option_id == winning_option);
    let winning_stake: i64 = winners.iter().map(|w| w.amount).sum();

    // Nobody backed the winning option: refund everyone.
    if winning_stake == 0 {
        return wagers
            .iter()
            .map(|w| PayoutAward {
                wager_id: w.id.clone(),
                agent_id: w.agent_id.clone(),
                amount: w.amount,
            })
            .collect();
    }

    // Floor division pass. The i128 widening keeps stake * pool exact for
    // any balances an i64 ledger can hold.
    let mut shares: Vec<(i64, PayoutAward)> = winners
        .iter()
        .map(|w| {
            let floored =
                (w.amount as i128 * prize_pool as i128 / winning_stake as i128) as i64;
            (
                w.amount,
                PayoutAward {
                    wager_id: w.id.clone(),
                    agent_id: w.agent_id.clone(),
                    amount: floored,
                },
            )
        })
        .collect();

    // Distribute the rounding remainder, one coin each, largest stakes
    // first. Vec::sort_by is stable, so equal stakes keep their input order
    // and the assignment is deterministic.
    let distributed: i64 = shares.iter().map(|(_, award)| award.amount).sum();
    let mut remainder = prize_pool - distributed;
    debug_assert!(remainder >= 0 && (remainder as usize) < shares.len().max(1));
    shares.sort_by(|a, b| b.0.cmp(&a.0));
    for (_, award) in &mut shares {
        if remainder == 0 {
            break;
        }
        award.amount += 1;
        remainder -= 1;
    }

    shares
        .into_iter()
        .map(|(_, award)| award)
        .chain(losers.iter().map(|w| PayoutAward {
            wager_id: w.id.clone(),
            agent_id: w.agent_id.clone(),
            amount: 0,
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::MarketId;

    fn wager(option: &OptionId, amount: i64) -> Wager {
        Wager::new(AgentId::new(), MarketId::from("m1"), option.clone(), amount)
    }

    fn award_for<'a>(awards: &'a [PayoutAward], wager: &Wager) -> &'a PayoutAward {
        awards
            .iter()
            .find(|a| a.wager_id == wager.id)
            .expect("every wager gets an award")
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let awards = calculate_payouts(&[], &OptionId::new());
        assert!(awards.is_empty());
    }

    #[test]
    fn spec_scenario_two_winners_two_losers() {
        // 4 wagers of {40, 10, 30, 20}; winners staked 40 and 10.
        // Pool = 100, winning stake = 50 -> payouts 80 and 20, no remainder.
        let win = OptionId::new();
        let lose = OptionId::new();
        let wagers = vec![
            wager(&win, 40),
            wager(&win, 10),
            wager(&lose, 30),
            wager(&lose, 20),
        ];

        let awards = calculate_payouts(&wagers, &win);

        assert_eq!(awards.len(), 4);
        assert_eq!(award_for(&awards, &wagers[0]).amount, 80);
        assert_eq!(award_for(&awards, &wagers[1]).amount, 20);
        assert_eq!(award_for(&awards, &wagers[2]).amount, 0);
        assert_eq!(award_for(&awards, &wagers[3]).amount, 0);
    }

    #[test]
    fn all_winners_reconstruct_their_stakes() {
        // {1,1,1} all on the winner: each floor(1/3 * 3) = 1, remainder 0.
        let win = OptionId::new();
        let wagers = vec![wager(&win, 1), wager(&win, 1), wager(&win, 1)];

        let awards = calculate_payouts(&wagers, &win);

        for w in &wagers {
            assert_eq!(award_for(&awards, w).amount, 1);
        }
    }

    #[test]
    fn tied_winners_split_remainder_deterministically() {
        // {1,1,1}, two on the winner: each floor(1/2 * 3) = 1, remainder 1.
        // The stable descending sort leaves the tied winners in input order,
        // so the first-placed winner takes the extra coin.
        let win = OptionId::new();
        let lose = OptionId::new();
        let wagers = vec![wager(&win, 1), wager(&win, 1), wager(&lose, 1)];

        let awards = calculate_payouts(&wagers, &win);

        assert_eq!(award_for(&awards, &wagers[0]).amount, 2);
        assert_eq!(award_for(&awards, &wagers[1]).amount, 1);
        assert_eq!(award_for(&awards, &wagers[2]).amount, 0);
    }

    #[test]
    fn remainder_goes_to_largest_stake_first() {
        // Pool = 10, winning stake = 7: floors are 2 (stake 2) and 7
        // (stake 5), distributed 9, remainder 1 -> largest stake gets it.
        let win = OptionId::new();
        let lose = OptionId::new();
        let wagers = vec![wager(&win, 2), wager(&win, 5), wager(&lose, 3)];

        let awards = calculate_payouts(&wagers, &win);

        assert_eq!(award_for(&awards, &wagers[1]).amount, 8);
        assert_eq!(award_for(&awards, &wagers[0]).amount, 2);
        assert_eq!(award_for(&awards, &wagers[2]).amount, 0);
    }

    #[test]
    fn no_winning_stake_refunds_every_wager() {
        let win = OptionId::new();
        let lose = OptionId::new();
        let wagers = vec![wager(&lose, 25), wager(&lose, 75)];

        let awards = calculate_payouts(&wagers, &win);

        assert_eq!(award_for(&awards, &wagers[0]).amount, 25);
        assert_eq!(award_for(&awards, &wagers[1]).amount, 75);
    }

    #[test]
    fn losers_always_get_zero() {
        let win = OptionId::new();
        let lose = OptionId::new();
        let wagers = vec![wager(&win, 13), wager(&lose, 7), wager(&lose, 91)];

        let awards = calculate_payouts(&wagers, &win);

        assert_eq!(award_for(&awards, &wagers[1]).amount, 0);
        assert_eq!(award_for(&awards, &wagers[2]).amount, 0);
    }

    #[test]
    fn conservation_holds_across_varied_stake_sets() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0x707e);
        for _ in 0..200 {
            let options: Vec<OptionId> = (0..rng.gen_range(2..=6)).map(|_| OptionId::new()).collect();
            let wagers: Vec<Wager> = (0..rng.gen_range(0..=12))
                .map(|_| {
                    let option = &options[rng.gen_range(0..options.len())];
                    wager(option, rng.gen_range(1..=1_000))
                })
                .collect();
            let winning = &options[rng.gen_range(0..options.len())];

            let awards = calculate_payouts(&wagers, winning);

            let pool: i64 = wagers.iter().map(|w| w.amount).sum();
            let paid: i64 = awards.iter().map(|a| a.amount).sum();
            assert_eq!(paid, pool, "conservation violated for {wagers:?}");
            assert_eq!(awards.len(), wagers.len());
        }
    }

    #[test]
    fn proportionality_bound_holds_for_winners() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0xbe7);
        for _ in 0..100 {
            let win = OptionId::new();
            let lose = OptionId::new();
            let wagers: Vec<Wager> = (0..rng.gen_range(1..=10))
                .map(|_| {
                    let option = if rng.gen_bool(0.5) { &win } else { &lose };
                    wager(option, rng.gen_range(1..=500))
                })
                .collect();

            let pool: i64 = wagers.iter().map(|w| w.amount).sum();
            let winning_stake: i64 = wagers
                .iter()
                .filter(|w| w.option_id == win)
                .map(|w| w.amount)
                .sum();
            if winning_stake == 0 {
                continue;
            }

            let awards = calculate_payouts(&wagers, &win);
            for w in wagers.iter().filter(|w| w.option_id == win) {
                let floor =
                    (w.amount as i128 * pool as i128 / winning_stake as i128) as i64;
                let paid = award_for(&awards, w).amount;
                assert!(
                    paid == floor || paid == floor + 1,
                    "payout {paid} outside [{floor}, {}] for stake {}",
                    floor + 1,
                    w.amount
                );
            }
        }
    }

    #[test]
    fn calculator_is_deterministic() {
        let win = OptionId::new();
        let lose = OptionId::new();
        let wagers = vec![
            wager(&win, 17),
            wager(&win, 17),
            wager(&win, 4),
            wager(&lose, 62),
        ];

        let first = calculate_payouts(&wagers, &win);
        let second = calculate_payouts(&wagers, &win);
        assert_eq!(first, second);
    }
}
