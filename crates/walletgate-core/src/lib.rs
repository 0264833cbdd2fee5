//! # Walletgate Core
//!
//! Core types for the Walletgate permissioning middleware.
//!
//! ## Overview
//!
//! This crate defines the vocabulary shared by the whole workspace:
//!
//! - Strong newtype identifiers: [`Txid`], [`Outpoint`], [`IdentityKey`],
//!   [`OriginatorDomain`], [`BasketName`]
//! - Protocol addressing: [`SecurityLevel`], [`ProtocolId`], [`Counterparty`]
//! - The [`WalletInterface`] async trait: the capability set of the
//!   underlying wallet, which the permissions manager both wraps (as its
//!   public surface) and consumes (for token encryption and issuance)
//! - Argument validation and the [`WalletError`] taxonomy

pub mod error;
pub mod types;
pub mod validation;
pub mod wallet;

pub use error::{Result, WalletError};
pub use types::{
    BasketName, Counterparty, IdentityKey, OriginatorDomain, Outpoint, ProtocolId, SecurityLevel,
    Txid,
};
pub use wallet::{
    AbortActionArgs, AbortActionResult, AcquireCertificateArgs, ActionInput, ActionOutput,
    ActionSummary, Certificate, CreateActionArgs, CreateActionResult, CreateHmacArgs,
    CreateHmacResult, CreateSignatureArgs, CreateSignatureResult, DecryptArgs, DecryptResult,
    DiscoverByAttributesArgs, DiscoverByIdentityKeyArgs, DiscoverCertificatesResult, EncryptArgs,
    EncryptResult, GetPublicKeyArgs, GetPublicKeyResult, InternalizeActionArgs,
    InternalizeActionResult, InternalizeOutput, InternalizeProtocol, KeyScope,
    ListActionsArgs, ListActionsResult, ListCertificatesArgs, ListCertificatesResult,
    ListOutputsArgs, ListOutputsResult, ProveCertificateArgs, ProveCertificateResult, QueryMode,
    RelinquishCertificateArgs, RelinquishCertificateResult, RelinquishOutputArgs,
    RelinquishOutputResult, VerifyHmacArgs, VerifyHmacResult, VerifySignatureArgs,
    VerifySignatureResult, WalletInterface, WalletOutput,
};
