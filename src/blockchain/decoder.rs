//! Transfer decoding for contract invocations.
//!
//! Two shapes are recognised:
//! - `TransferContract`: a native TRX transfer whose recipient and amount are
//!   structured fields of the invocation.
//! - `TriggerSmartContract` whose call data is a TRC20
//!   `transfer(address,uint256)` call: selector `a9059cbb`, one left-padded
//!   address word, one big-endian amount word.
//!
//! Anything else, or data too short to decode, yields `None` and the
//! invocation is skipped. The token contract itself is not checked here.

use alloy::sol;
use alloy::sol_types::SolCall;

use crate::blockchain::address::TronAddress;
use crate::blockchain::types::{
    AssetKind, ContractInvocation, DecodedTransfer, CONTRACT_CALL_KIND, NATIVE_TRANSFER_KIND,
};
use alloy::primitives::U256;

/// Decimal scale of TRX (1 TRX = 10^6 sun).
pub const NATIVE_DECIMALS: u32 = 6;

sol! {
    /// TRC20 token transfer.
    function transfer(address to, uint256 value) external returns (bool);
}

/// Four-byte selector of `transfer(address,uint256)`.
pub const TRANSFER_SELECTOR: [u8; 4] = transferCall::SELECTOR;

/// Decode a single invocation into a transfer, if it carries one.
pub fn decode_invocation(
    invocation: &ContractInvocation,
    token_decimals: u32,
) -> Option<DecodedTransfer> {
    let sender = TronAddress::from_raw(invocation.owner_address.as_deref()?).ok()?;

    match invocation.kind.as_str() {
        CONTRACT_CALL_KIND => {
            let data = invocation.data.as_deref()?;
            let (recipient, amount_minor) = decode_transfer_call(data)?;
            let contract_address = invocation
                .contract_address
                .as_deref()
                .and_then(|raw| TronAddress::from_raw(raw).ok());

            Some(DecodedTransfer {
                asset_kind: AssetKind::Token,
                sender,
                recipient,
                amount_minor,
                decimals: token_decimals,
                contract_address,
            })
        }
        NATIVE_TRANSFER_KIND => {
            let recipient = TronAddress::from_raw(invocation.to_address.as_deref()?).ok()?;
            let amount = invocation.amount?;

            Some(DecodedTransfer {
                asset_kind: AssetKind::Native,
                sender,
                recipient,
                amount_minor: U256::from(amount),
                decimals: NATIVE_DECIMALS,
                contract_address: None,
            })
        }
        _ => None,
    }
}

/// Decode TRC20 `transfer` call data into (recipient, amount in minor units).
pub fn decode_transfer_call(data: &[u8]) -> Option<(TronAddress, U256)> {
    if !data.starts_with(&TRANSFER_SELECTOR) {
        return None;
    }
    let call = transferCall::abi_decode(data).ok()?;
    Some((TronAddress::from_account_hash(call.to.into_array()), call.value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPIENT_HASH: &str = "a614f803b6fd780986a42c78ec9c7f77e6ded13c";
    const RECIPIENT_BASE58: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";
    const SENDER_HEX: &str = "41f39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    fn call_data() -> Vec<u8> {
        let hex_data = format!(
            "a9059cbb000000000000000000000000{}{}",
            RECIPIENT_HASH, "0000000000000000000000000000000000000000000000000000000005f5e100"
        );
        hex::decode(hex_data).unwrap()
    }

    fn raw(hex_addr: &str) -> Vec<u8> {
        hex::decode(hex_addr).unwrap()
    }

    #[test]
    fn test_selector_constant() {
        assert_eq!(TRANSFER_SELECTOR, [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn test_decode_transfer_call() {
        let (recipient, amount) = decode_transfer_call(&call_data()).unwrap();
        assert_eq!(recipient.to_base58(), RECIPIENT_BASE58);
        assert_eq!(amount, U256::from(100_000_000u64));
    }

    #[test]
    fn test_decode_token_invocation() {
        let invocation = ContractInvocation {
            kind: CONTRACT_CALL_KIND.to_string(),
            owner_address: Some(raw(SENDER_HEX)),
            contract_address: Some(raw("41a614f803b6fd780986a42c78ec9c7f77e6ded13c")),
            data: Some(call_data()),
            ..Default::default()
        };

        let transfer = decode_invocation(&invocation, 6).unwrap();
        assert_eq!(transfer.asset_kind, AssetKind::Token);
        assert_eq!(transfer.recipient.to_base58(), RECIPIENT_BASE58);
        assert_eq!(transfer.sender.to_hex(), SENDER_HEX);
        assert_eq!(transfer.amount(), 100.0);
        assert!(transfer.contract_address.is_some());
    }

    #[test]
    fn test_decode_native_invocation() {
        let invocation = ContractInvocation {
            kind: NATIVE_TRANSFER_KIND.to_string(),
            owner_address: Some(raw(SENDER_HEX)),
            to_address: Some(raw("41a614f803b6fd780986a42c78ec9c7f77e6ded13c")),
            amount: Some(5_000_000),
            ..Default::default()
        };

        let transfer = decode_invocation(&invocation, 6).unwrap();
        assert_eq!(transfer.asset_kind, AssetKind::Native);
        assert_eq!(transfer.amount(), 5.0);
        assert_eq!(transfer.contract_address, None);
    }

    #[test]
    fn test_short_call_data_is_skipped() {
        let mut data = call_data();
        data.truncate(40);
        assert!(decode_transfer_call(&data).is_none());

        let invocation = ContractInvocation {
            kind: CONTRACT_CALL_KIND.to_string(),
            owner_address: Some(raw(SENDER_HEX)),
            data: Some(data),
            ..Default::default()
        };
        assert!(decode_invocation(&invocation, 6).is_none());
    }

    #[test]
    fn test_other_selector_is_skipped() {
        let mut data = call_data();
        // approve(address,uint256)
        data[..4].copy_from_slice(&[0x09, 0x5e, 0xa7, 0xb3]);
        assert!(decode_transfer_call(&data).is_none());
    }

    #[test]
    fn test_unknown_kind_is_skipped() {
        let invocation = ContractInvocation {
            kind: "FreezeBalanceV2Contract".to_string(),
            owner_address: Some(raw(SENDER_HEX)),
            ..Default::default()
        };
        assert!(decode_invocation(&invocation, 6).is_none());
    }

    #[test]
    fn test_missing_owner_is_skipped() {
        let invocation = ContractInvocation {
            kind: NATIVE_TRANSFER_KIND.to_string(),
            to_address: Some(raw(SENDER_HEX)),
            amount: Some(1),
            ..Default::default()
        };
        assert!(decode_invocation(&invocation, 6).is_none());
    }
}
