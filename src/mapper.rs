//! Maps a scanned bridge event to the call made on the counterpart chain.
//!
//! - `Deposit(token, recipient, amount)` on source -> `wrap(token, recipient, amount)` on destination
//! - `Unwrap(underlying, wrapped, from, to, amount)` on destination -> `withdraw(underlying, to, amount)` on source
//!
//! `wrapped_token` and `from` are carried by the event for auditing only.

use crate::error::RelayError;
use crate::types::{ChainRole, RelayCall, RelayEvent, TargetFunction};

/// Derive the outbound call for an event observed on `scanned`
pub fn map_event(scanned: ChainRole, event: &RelayEvent) -> Result<RelayCall, RelayError> {
    match (scanned, event) {
        (ChainRole::Source, RelayEvent::Deposit(deposit)) => Ok(RelayCall {
            function: TargetFunction::Wrap,
            token: deposit.token,
            recipient: deposit.recipient,
            amount: deposit.amount,
        }),
        (ChainRole::Destination, RelayEvent::Unwrap(unwrap)) => Ok(RelayCall {
            function: TargetFunction::Withdraw,
            token: unwrap.underlying_token,
            recipient: unwrap.to,
            amount: unwrap.amount,
        }),
        (role, event) => Err(RelayError::scan(
            role,
            format!("no relay mapping for a {} event observed on {}", event.name(), role),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DepositEvent, UnwrapEvent};
    use alloy::primitives::{Address, U256};

    fn deposit() -> RelayEvent {
        RelayEvent::Deposit(DepositEvent {
            token: Address::repeat_byte(0x0a),
            recipient: Address::repeat_byte(0x0b),
            amount: U256::from(1_000_000u64),
        })
    }

    fn unwrap_event(wrapped: u8, from: u8) -> RelayEvent {
        RelayEvent::Unwrap(UnwrapEvent {
            underlying_token: Address::repeat_byte(0x01),
            wrapped_token: Address::repeat_byte(wrapped),
            from: Address::repeat_byte(from),
            to: Address::repeat_byte(0x04),
            amount: U256::from(42u64),
        })
    }

    #[test]
    fn test_deposit_maps_to_wrap() {
        let call = map_event(ChainRole::Source, &deposit()).unwrap();
        assert_eq!(
            call,
            RelayCall {
                function: TargetFunction::Wrap,
                token: Address::repeat_byte(0x0a),
                recipient: Address::repeat_byte(0x0b),
                amount: U256::from(1_000_000u64),
            }
        );
    }

    #[test]
    fn test_unwrap_maps_to_withdraw() {
        let call = map_event(ChainRole::Destination, &unwrap_event(0x02, 0x03)).unwrap();
        assert_eq!(
            call,
            RelayCall {
                function: TargetFunction::Withdraw,
                token: Address::repeat_byte(0x01),
                recipient: Address::repeat_byte(0x04),
                amount: U256::from(42u64),
            }
        );
    }

    #[test]
    fn test_withdraw_ignores_wrapped_token_and_sender() {
        let a = map_event(ChainRole::Destination, &unwrap_event(0x02, 0x03)).unwrap();
        let b = map_event(ChainRole::Destination, &unwrap_event(0xee, 0xff)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_mismatched_role_rejected() {
        let err = map_event(ChainRole::Destination, &deposit()).unwrap_err();
        assert!(matches!(err, RelayError::Scan { role: ChainRole::Destination, .. }));

        let err = map_event(ChainRole::Source, &unwrap_event(0x02, 0x03)).unwrap_err();
        assert!(matches!(err, RelayError::Scan { role: ChainRole::Source, .. }));
    }
}
