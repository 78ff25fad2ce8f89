//! Loan session: the linked down-payment / EMI controls as an explicit state
//! machine.
//!
//! A [`LoanSession`] is a plain value. [`LoanSession::apply`] takes one
//! [`SessionEvent`] and returns the next state with down payment and EMI
//! consistent again. Moving the down payment recomputes the EMI; moving the EMI
//! recomputes the down payment; principal, rate and tenure changes hold the
//! down payment and recompute the EMI.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{CalculatorConfig, RateConvention};
use crate::emi::engine::{
    clamp_percent, compute_down_payment_with, compute_emi_with, emi_range, round_whole,
    total_down_payment, total_repayment, EmiRange,
};
use crate::emi::format::DisplayAmounts;
use crate::error::EmiError;
use crate::types::{Money, Months, Percent};
use crate::EmiResult;

/// Which control last drove the pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliderMode {
    #[default]
    DownPaymentDriven,
    EmiDriven,
}

/// One user input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "value", rename_all = "snake_case")]
pub enum SessionEvent {
    SetPrincipal(Money),
    SetInterestRate(Percent),
    SetProcessingFee(Percent),
    SetTenure(Months),
    DragDownPayment(Money),
    DragEmi(Money),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSession {
    principal: Money,
    interest_rate: Percent,
    processing_fee: Percent,
    tenure: Months,
    down_payment: Money,
    emi: Money,
    mode: SliderMode,
    tenure_options: Vec<Months>,
    convention: RateConvention,
}

/// Everything a front end renders for the current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub initialized: bool,
    pub principal: Money,
    pub interest_rate: Percent,
    pub processing_fee: Percent,
    pub tenure: Months,
    pub tenure_options: Vec<Months>,
    pub down_payment: Money,
    pub emi: Money,
    pub min_emi: Money,
    pub max_emi: Money,
    pub total_down_payment: Money,
    pub total_repayment: Money,
    pub mode: SliderMode,
    pub display: DisplayAmounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStep {
    pub index: usize,
    pub event: SessionEvent,
    pub view: SessionView,
}

/// Result of replaying a sequence of events from a fresh session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTrace {
    pub steps: Vec<SessionStep>,
    pub final_view: SessionView,
}

impl LoanSession {
    /// Fresh session with no principal, seeded from the config defaults.
    pub fn new(config: &CalculatorConfig) -> EmiResult<Self> {
        config.validate()?;
        Ok(Self {
            principal: Decimal::ZERO,
            interest_rate: config.default_interest_rate,
            processing_fee: config.default_processing_fee,
            tenure: config.default_tenure,
            down_payment: Decimal::ZERO,
            emi: Decimal::ZERO,
            mode: SliderMode::default(),
            tenure_options: config.tenure_options.clone(),
            convention: config.convention,
        })
    }

    pub fn principal(&self) -> Money {
        self.principal
    }

    pub fn interest_rate(&self) -> Percent {
        self.interest_rate
    }

    pub fn processing_fee(&self) -> Percent {
        self.processing_fee
    }

    pub fn tenure(&self) -> Months {
        self.tenure
    }

    pub fn down_payment(&self) -> Money {
        self.down_payment
    }

    pub fn emi(&self) -> Money {
        self.emi
    }

    pub fn mode(&self) -> SliderMode {
        self.mode
    }

    /// A principal is configured; the sliders are live.
    pub fn is_initialized(&self) -> bool {
        self.principal > Decimal::ZERO
    }

    /// Apply one event and return the resulting state.
    pub fn apply(&self, event: &SessionEvent) -> EmiResult<LoanSession> {
        let mut next = self.clone();

        match *event {
            SessionEvent::SetPrincipal(value) => {
                next.principal = value.max(Decimal::ZERO);
                if next.down_payment > next.principal {
                    next.down_payment = next.principal;
                }
                next.resync_emi()?;
            }
            SessionEvent::SetInterestRate(value) => {
                next.interest_rate = clamp_percent(value);
                next.resync_emi()?;
            }
            SessionEvent::SetProcessingFee(value) => {
                next.processing_fee = clamp_percent(value);
            }
            SessionEvent::SetTenure(months) => {
                if !next.tenure_options.contains(&months) {
                    return Err(EmiError::InvalidInput {
                        field: "tenure".into(),
                        reason: format!(
                            "{months} months is not one of {:?}",
                            next.tenure_options
                        ),
                    });
                }
                next.tenure = months;
                next.resync_emi()?;
            }
            SessionEvent::DragDownPayment(value) => {
                if !next.is_initialized() {
                    log::debug!("ignoring down payment drag: principal not set");
                    return Ok(next);
                }
                // Round before clamping so a fractional principal stays the upper bound
                next.down_payment = round_whole(value).max(Decimal::ZERO).min(next.principal);
                next.emi = next.emi_for(next.down_payment)?;
                next.mode = SliderMode::DownPaymentDriven;
            }
            SessionEvent::DragEmi(value) => {
                if !next.is_initialized() {
                    log::debug!("ignoring EMI drag: principal not set");
                    return Ok(next);
                }
                let target = round_whole(next.range()?.clamp(value));
                next.emi = target;
                if let Some(down_payment) = compute_down_payment_with(
                    next.convention,
                    next.principal,
                    target,
                    next.interest_rate,
                    next.tenure,
                )? {
                    next.down_payment = down_payment;
                }
                next.mode = SliderMode::EmiDriven;
            }
        }

        log::debug!(
            "{:?} -> principal={} down_payment={} emi={} mode={:?}",
            event,
            next.principal,
            next.down_payment,
            next.emi,
            next.mode
        );
        Ok(next)
    }

    /// Current EMI control bounds; zero-width when uninitialized.
    pub fn range(&self) -> EmiResult<EmiRange> {
        Ok(
            emi_range(self.convention, self.principal, self.interest_rate, self.tenure)?
                .unwrap_or(EmiRange {
                    min_emi: Decimal::ZERO,
                    max_emi: Decimal::ZERO,
                }),
        )
    }

    pub fn view(&self) -> EmiResult<SessionView> {
        let range = self.range()?;
        let total_dp =
            total_down_payment(self.principal, self.down_payment, self.processing_fee)?;
        let total_paid = total_repayment(self.emi, self.tenure)?;

        Ok(SessionView {
            initialized: self.is_initialized(),
            principal: self.principal,
            interest_rate: self.interest_rate,
            processing_fee: self.processing_fee,
            tenure: self.tenure,
            tenure_options: self.tenure_options.clone(),
            down_payment: self.down_payment,
            emi: self.emi,
            min_emi: range.min_emi,
            max_emi: range.max_emi,
            total_down_payment: total_dp,
            total_repayment: total_paid,
            mode: self.mode,
            display: DisplayAmounts::new(self.down_payment, self.emi, total_dp, total_paid),
        })
    }

    /// Hold the down payment and recompute the EMI, or zero both when no
    /// principal is set.
    fn resync_emi(&mut self) -> EmiResult<()> {
        if self.is_initialized() {
            self.emi = self.emi_for(self.down_payment)?;
        } else {
            self.down_payment = Decimal::ZERO;
            self.emi = Decimal::ZERO;
        }
        self.mode = SliderMode::DownPaymentDriven;
        Ok(())
    }

    fn emi_for(&self, down_payment: Money) -> EmiResult<Money> {
        Ok(compute_emi_with(
            self.convention,
            self.principal,
            down_payment,
            self.interest_rate,
            self.tenure,
        )?
        .unwrap_or(Decimal::ZERO))
    }
}

/// Apply `events` in order to a fresh session, recording the view after each.
pub fn replay(config: &CalculatorConfig, events: &[SessionEvent]) -> EmiResult<SessionTrace> {
    let mut session = LoanSession::new(config)?;
    let mut steps = Vec::with_capacity(events.len());

    for (index, event) in events.iter().enumerate() {
        session = session.apply(event)?;
        steps.push(SessionStep {
            index,
            event: event.clone(),
            view: session.view()?,
        });
    }

    Ok(SessionTrace {
        steps,
        final_view: session.view()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn session_with_principal(principal: Money) -> LoanSession {
        LoanSession::new(&CalculatorConfig::default())
            .unwrap()
            .apply(&SessionEvent::SetPrincipal(principal))
            .unwrap()
    }

    #[test]
    fn test_new_session_uses_defaults() {
        let session = LoanSession::new(&CalculatorConfig::default()).unwrap();
        assert!(!session.is_initialized());
        assert_eq!(session.interest_rate(), dec!(10));
        assert_eq!(session.processing_fee(), dec!(1));
        assert_eq!(session.tenure(), 12);
        assert_eq!(session.emi(), Decimal::ZERO);
    }

    #[test]
    fn test_set_principal_computes_emi() {
        let session = session_with_principal(dec!(1_200_000));
        assert_eq!(session.down_payment(), Decimal::ZERO);
        assert_eq!(session.emi(), dec!(110_000));
    }

    #[test]
    fn test_drag_down_payment_recomputes_emi() {
        let session = session_with_principal(dec!(1_200_000))
            .apply(&SessionEvent::DragDownPayment(dec!(200_000)))
            .unwrap();
        assert_eq!(session.emi(), dec!(91_667));
        assert_eq!(session.mode(), SliderMode::DownPaymentDriven);
    }

    #[test]
    fn test_drag_down_payment_clamped_and_rounded() {
        let session = session_with_principal(dec!(1_000))
            .apply(&SessionEvent::DragDownPayment(dec!(5_000.4)))
            .unwrap();
        assert_eq!(session.down_payment(), dec!(1_000));
        assert_eq!(session.emi(), Decimal::ZERO);
    }

    #[test]
    fn test_drag_down_payment_fractional_principal() {
        let session = session_with_principal(dec!(1_000.6));
        let full = session.apply(&SessionEvent::DragDownPayment(dec!(1_000.6))).unwrap();
        assert_eq!(full.down_payment(), dec!(1_000.6));
        assert_eq!(full.emi(), Decimal::ZERO);

        let partial = session.apply(&SessionEvent::DragDownPayment(dec!(400.4))).unwrap();
        assert_eq!(partial.down_payment(), dec!(400));
        assert!(partial.view().is_ok());
    }

    #[test]
    fn test_drag_emi_recomputes_down_payment() {
        let session = session_with_principal(dec!(1_200_000))
            .apply(&SessionEvent::DragEmi(dec!(55_000)))
            .unwrap();
        assert_eq!(session.emi(), dec!(55_000));
        assert_eq!(session.down_payment(), dec!(600_000));
        assert_eq!(session.mode(), SliderMode::EmiDriven);
    }

    #[test]
    fn test_drag_emi_clamped_to_range() {
        let session = session_with_principal(dec!(1_200_000))
            .apply(&SessionEvent::DragEmi(dec!(999_999)))
            .unwrap();
        assert_eq!(session.emi(), dec!(110_000));
        assert_eq!(session.down_payment(), Decimal::ZERO);
    }

    #[test]
    fn test_drags_ignored_without_principal() {
        let session = LoanSession::new(&CalculatorConfig::default()).unwrap();
        let after = session
            .apply(&SessionEvent::DragDownPayment(dec!(100)))
            .unwrap()
            .apply(&SessionEvent::DragEmi(dec!(100)))
            .unwrap();
        assert_eq!(after, session);
    }

    #[test]
    fn test_tenure_change_holds_down_payment() {
        let session = session_with_principal(dec!(1_200_000))
            .apply(&SessionEvent::DragEmi(dec!(55_000)))
            .unwrap()
            .apply(&SessionEvent::SetTenure(24))
            .unwrap();
        assert_eq!(session.down_payment(), dec!(600_000));
        // 600k * 0.1 * 1.21 / 0.21 / 12 = 28,809.52
        assert_eq!(session.emi(), dec!(28_810));
        assert_eq!(session.mode(), SliderMode::DownPaymentDriven);
    }

    #[test]
    fn test_tenure_outside_options_rejected() {
        let session = session_with_principal(dec!(1_200_000));
        let err = session.apply(&SessionEvent::SetTenure(18)).unwrap_err();
        assert!(matches!(err, EmiError::InvalidInput { .. }));
    }

    #[test]
    fn test_rate_clamped() {
        let session = session_with_principal(dec!(1_200_000));
        let high = session.apply(&SessionEvent::SetInterestRate(dec!(150))).unwrap();
        assert_eq!(high.interest_rate(), dec!(100));
        let low = session.apply(&SessionEvent::SetInterestRate(dec!(-5))).unwrap();
        assert_eq!(low.interest_rate(), Decimal::ZERO);
        // Zero rate: straight line 1.2M / 12
        assert_eq!(low.emi(), dec!(100_000));
    }

    #[test]
    fn test_fee_clamped_and_emi_untouched() {
        let session = session_with_principal(dec!(1_200_000));
        let next = session.apply(&SessionEvent::SetProcessingFee(dec!(250))).unwrap();
        assert_eq!(next.processing_fee(), dec!(100));
        assert_eq!(next.emi(), session.emi());
    }

    #[test]
    fn test_zero_principal_resets_pair() {
        let session = session_with_principal(dec!(1_200_000))
            .apply(&SessionEvent::DragDownPayment(dec!(300_000)))
            .unwrap()
            .apply(&SessionEvent::SetPrincipal(Decimal::ZERO))
            .unwrap();
        assert_eq!(session.down_payment(), Decimal::ZERO);
        assert_eq!(session.emi(), Decimal::ZERO);
        assert!(!session.is_initialized());
    }

    #[test]
    fn test_principal_below_down_payment_clamps() {
        let session = session_with_principal(dec!(1_200_000))
            .apply(&SessionEvent::DragDownPayment(dec!(800_000)))
            .unwrap()
            .apply(&SessionEvent::SetPrincipal(dec!(500_000)))
            .unwrap();
        assert_eq!(session.down_payment(), dec!(500_000));
        assert_eq!(session.emi(), Decimal::ZERO);
    }

    #[test]
    fn test_view_totals() {
        let view = session_with_principal(dec!(1_200_000))
            .apply(&SessionEvent::DragDownPayment(dec!(200_000)))
            .unwrap()
            .view()
            .unwrap();
        assert_eq!(view.total_down_payment, dec!(210_000));
        assert_eq!(view.total_repayment, dec!(1_100_004));
        assert_eq!(view.max_emi, dec!(110_000));
        assert_eq!(view.display.total_repayment, "1,100,004");
    }

    #[test]
    fn test_replay_records_each_step() {
        let events = vec![
            SessionEvent::SetPrincipal(dec!(1_200_000)),
            SessionEvent::DragDownPayment(dec!(200_000)),
            SessionEvent::SetTenure(36),
        ];
        let trace = replay(&CalculatorConfig::default(), &events).unwrap();
        assert_eq!(trace.steps.len(), 3);
        assert_eq!(trace.steps[1].view.emi, dec!(91_667));
        assert_eq!(trace.final_view.tenure, 36);
        assert_eq!(trace.final_view.down_payment, dec!(200_000));
    }

    #[test]
    fn test_event_json_shape() {
        let event: SessionEvent =
            serde_json::from_str(r#"{"event": "drag_emi", "value": "55000"}"#).unwrap();
        assert_eq!(event, SessionEvent::DragEmi(dec!(55_000)));
        let tenure: SessionEvent =
            serde_json::from_str(r#"{"event": "set_tenure", "value": 24}"#).unwrap();
        assert_eq!(tenure, SessionEvent::SetTenure(24));
    }
}
