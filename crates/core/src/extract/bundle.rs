//! Normalized per-account input bundle for the extraction cascade.

use cardsync_aggregator::models::{AccountData, CreditLiability, LiabilitiesData};

use crate::institutions::{classify, InstitutionPolicy};

/// Everything the extraction strategies may look at for one account.
///
/// The same account can appear in three response shapes — the accounts
/// endpoint, the balances endpoint, and embedded in the liabilities
/// response — and institutions disagree about which copy carries usable
/// data, so all three are kept side by side.
#[derive(Clone, Copy)]
pub struct AccountBundle<'a> {
    /// The account as the accounts endpoint reported it
    pub account: &'a AccountData,
    /// The same account from the balances endpoint, when present
    pub balance_account: Option<&'a AccountData>,
    /// The same account as embedded in the liabilities response
    pub liability_account: Option<&'a AccountData>,
    /// The credit liability record for this account
    pub liability: Option<&'a CreditLiability>,
    pub policy: &'static InstitutionPolicy,
}

impl<'a> AccountBundle<'a> {
    /// Assemble the bundle for `account` by joining the balances and
    /// liabilities responses on account id.
    pub fn assemble(
        account: &'a AccountData,
        balances: &'a [AccountData],
        liabilities: &'a LiabilitiesData,
        institution_name: &str,
    ) -> Self {
        let balance_account = balances
            .iter()
            .find(|a| a.account_id == account.account_id);
        let liability_account = liabilities
            .accounts
            .iter()
            .find(|a| a.account_id == account.account_id);
        let liability = liabilities
            .credit
            .iter()
            .find(|l| l.account_id.as_deref() == Some(account.account_id.as_str()));
        let policy = classify(institution_name, &account.display_name());

        Self {
            account,
            balance_account,
            liability_account,
            liability,
            policy,
        }
    }

    /// Balance sources in cascade order: balances endpoint, accounts
    /// endpoint, liabilities endpoint.
    pub fn balance_sources(&self) -> [Option<&'a AccountData>; 3] {
        [
            self.balance_account,
            Some(self.account),
            self.liability_account,
        ]
    }
}
