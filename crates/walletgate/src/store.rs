//! The on-chain token store.
//!
//! Finds, issues, renews, and revokes permission tokens by delegating output
//! search and transaction construction to the underlying wallet. Renewal
//! consumes the previous token's outpoint in the same transaction that
//! creates its replacement, so at most one live token exists per resource.
//! This module performs no transaction-level retry; construction failures
//! propagate unmodified.

use std::sync::Arc;

use walletgate_core::{
    ActionInput, ActionOutput, CreateActionArgs, GetPublicKeyArgs, IdentityKey, KeyScope,
    ListActionsArgs, ListOutputsArgs, OriginatorDomain, ProtocolId, QueryMode, SecurityLevel,
    Txid, WalletInterface,
};
use walletgate_tokens::{
    build_fields, build_token_script, parse_token, parse_token_script, PermissionRequest,
    PermissionToken, PermissionType,
};

use crate::error::Result;

/// Satoshis locked into each token output.
const TOKEN_SATOSHIS: u64 = 1;

/// Upper bound on outputs fetched per token search.
const LIST_LIMIT: u32 = 10_000;

/// Label prefix applied to originator-initiated actions for the spending tally.
const ORIGINATOR_LABEL_PREFIX: &str = "admin originator";

/// The label marking actions initiated by the given originator.
pub fn originator_label(originator: &OriginatorDomain) -> String {
    format!("{ORIGINATOR_LABEL_PREFIX} {originator}")
}

/// Finds, creates, renews, and revokes on-chain permission tokens.
///
/// The store holds the only write path to token outputs; evaluation code
/// reads token snapshots and never constructs transactions itself.
pub struct TokenStore {
    wallet: Arc<dyn WalletInterface>,
}

impl TokenStore {
    pub fn new(wallet: Arc<dyn WalletInterface>) -> Self {
        Self { wallet }
    }

    /// Find a token matching the request's resource identity.
    ///
    /// Prefers a currently valid token; falls back to an expired match so
    /// the caller can turn the request into a renewal. Outputs that fail to
    /// decode are skipped, not fatal.
    pub async fn find_token(&self, request: &PermissionRequest) -> Result<Option<PermissionToken>> {
        let now = now_secs();
        let mut expired_match = None;

        for token in self.list_tokens(request.permission_type()).await? {
            if !token.matches(request) {
                continue;
            }
            if !token.is_expired(now) {
                return Ok(Some(token));
            }
            expired_match.get_or_insert(token);
        }
        Ok(expired_match)
    }

    /// Decode every token of a kind, optionally restricted to one originator.
    pub async fn list_tokens_for(
        &self,
        permission_type: PermissionType,
        originator: Option<&OriginatorDomain>,
    ) -> Result<Vec<PermissionToken>> {
        let tokens = self.list_tokens(permission_type).await?;
        Ok(match originator {
            Some(origin) => tokens
                .into_iter()
                .filter(|t| t.originator == *origin)
                .collect(),
            None => tokens,
        })
    }

    async fn list_tokens(&self, permission_type: PermissionType) -> Result<Vec<PermissionToken>> {
        let listed = self
            .wallet
            .list_outputs(
                ListOutputsArgs {
                    basket: permission_type.basket(),
                    tags: vec![permission_type.tag().to_string()],
                    tag_query_mode: QueryMode::All,
                    include_locking_scripts: true,
                    limit: LIST_LIMIT,
                },
                None,
            )
            .await?;

        let mut tokens = Vec::new();
        for output in listed.outputs {
            if !output.spendable {
                continue;
            }
            let Some(script) = output.locking_script else {
                continue;
            };
            let decoded = match parse_token_script(&script) {
                Ok(fields) => {
                    parse_token(
                        self.wallet.as_ref(),
                        permission_type,
                        output.outpoint,
                        output.satoshis,
                        &fields,
                    )
                    .await
                }
                Err(e) => Err(e),
            };
            match decoded {
                Ok(token) => tokens.push(token),
                Err(error) => {
                    tracing::debug!(outpoint = %output.outpoint, %error, "skipping undecodable output");
                }
            }
        }
        Ok(tokens)
    }

    /// Issue a token for a granted request, or renew the request's previous
    /// token by spending it in the same transaction.
    ///
    /// `expiry` is ignored for spending tokens (they are not time-limited);
    /// `amount` is the authorized amount for spending tokens.
    pub async fn create_or_renew(
        &self,
        request: &PermissionRequest,
        expiry: i64,
        amount: Option<u64>,
    ) -> Result<Txid> {
        let permission_type = request.permission_type();
        let fields = build_fields(self.wallet.as_ref(), request, expiry, amount).await?;
        let owner = self.identity_key().await?;
        let script = build_token_script(&owner, &fields);

        let inputs = match &request.previous_token {
            Some(previous) => vec![ActionInput {
                outpoint: previous.outpoint,
                input_description: format!("spend superseded {permission_type} token"),
            }],
            None => Vec::new(),
        };
        let description = if request.renewal {
            format!("renew {permission_type} permission for {}", request.originator)
        } else {
            format!("grant {permission_type} permission for {}", request.originator)
        };

        let result = self
            .wallet
            .create_action(
                CreateActionArgs {
                    description,
                    inputs,
                    outputs: vec![ActionOutput {
                        locking_script: script,
                        satoshis: TOKEN_SATOSHIS,
                        output_description: format!("{permission_type} permission token"),
                        basket: Some(permission_type.basket()),
                        tags: vec![permission_type.tag().to_string()],
                    }],
                    labels: Vec::new(),
                },
                None,
            )
            .await?;

        tracing::debug!(
            txid = %result.txid,
            kind = %permission_type,
            originator = %request.originator,
            renewal = request.renewal,
            "permission token issued"
        );
        Ok(result.txid)
    }

    /// Revoke a token: spend its outpoint without a replacement output.
    pub async fn revoke(&self, token: &PermissionToken) -> Result<Txid> {
        let result = self
            .wallet
            .create_action(
                CreateActionArgs {
                    description: format!(
                        "revoke {} permission for {}",
                        token.permission_type(),
                        token.originator
                    ),
                    inputs: vec![ActionInput {
                        outpoint: token.outpoint,
                        input_description: format!("spend revoked {} token", token.permission_type()),
                    }],
                    outputs: Vec::new(),
                    labels: Vec::new(),
                },
                None,
            )
            .await?;

        tracing::debug!(txid = %result.txid, token = %token, "permission token revoked");
        Ok(result.txid)
    }

    /// Net satoshis spent by an originator's labeled actions since `since`.
    pub async fn query_spent_since(
        &self,
        originator: &OriginatorDomain,
        since: i64,
    ) -> Result<u64> {
        let listed = self
            .wallet
            .list_actions(
                ListActionsArgs {
                    labels: vec![originator_label(originator)],
                    label_query_mode: QueryMode::All,
                    limit: LIST_LIMIT,
                },
                None,
            )
            .await?;

        let spent = listed
            .actions
            .iter()
            .filter(|a| a.created_at >= since && a.satoshis < 0)
            .map(|a| a.satoshis.unsigned_abs())
            .sum();
        Ok(spent)
    }

    async fn identity_key(&self) -> Result<IdentityKey> {
        let result = self
            .wallet
            .get_public_key(
                GetPublicKeyArgs {
                    scope: KeyScope::self_scope(
                        ProtocolId::new_unchecked(SecurityLevel::Open, "identity"),
                        "1",
                    ),
                    identity_key: true,
                    for_self: true,
                },
                None,
            )
            .await?;
        Ok(result.public_key)
    }
}

/// Current time in Unix seconds.
pub(crate) fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs() as i64
}

/// Unix seconds of the first instant of the month containing `now` (UTC).
pub(crate) fn month_start(now: i64) -> i64 {
    let days = now.div_euclid(86_400);
    let (year, month, _) = civil_from_days(days);
    days_from_civil(year, month, 1) * 86_400
}

// Calendar conversion, Gregorian, from Howard Hinnant's algorithms.

fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}

fn days_from_civil(y: i64, m: u32, d: u32) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = y.div_euclid(400);
    let yoe = y.rem_euclid(400);
    let mp = i64::from(if m > 2 { m - 3 } else { m + 9 });
    let doy = (153 * mp + 2) / 5 + i64::from(d) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_start_is_idempotent() {
        let start = month_start(1_700_000_000); // 2023-11-14
        assert_eq!(month_start(start), start);
        assert!(start <= 1_700_000_000);
    }

    #[test]
    fn test_month_start_known_value() {
        // 2023-11-14T22:13:20Z -> 2023-11-01T00:00:00Z
        assert_eq!(month_start(1_700_000_000), 1_698_796_800);
    }

    #[test]
    fn test_civil_roundtrip() {
        for days in [-1, 0, 1, 19_000, 738_000] {
            let (y, m, d) = civil_from_days(days);
            assert_eq!(days_from_civil(y, m, d), days);
        }
    }

    #[test]
    fn test_originator_label() {
        let origin = OriginatorDomain::new("app.example.com").unwrap();
        assert_eq!(originator_label(&origin), "admin originator app.example.com");
    }
}
