use clap::Args;
use clap_complete::Shell;
use consorcio_core::estimate_bid;

#[derive(Args, Debug, Clone)]
pub struct LanceArgs {
    /// Valor da carta
    #[arg(long = "credit", value_name = "VALOR", default_value_t = 60_000.0)]
    pub credit_value: f64,
    /// Lance como percentual da carta
    #[arg(long, value_name = "PCT", default_value_t = 25.0)]
    pub percent: f64,
    /// Lance fixo em reais (tem prioridade sobre o percentual)
    #[arg(long, value_name = "VALOR")]
    pub fixed: Option<f64>,
}

impl LanceArgs {
    pub fn amount(&self) -> f64 {
        estimate_bid(self.credit_value, self.percent, self.fixed)
    }

    /// Bid as a share of the credit, whichever way it was entered.
    pub fn effective_percent(&self) -> f64 {
        if self.credit_value > 0.0 {
            self.amount() / self.credit_value * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell alvo
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_amount_wins_over_percent() {
        let args = LanceArgs {
            credit_value: 80_000.0,
            percent: 30.0,
            fixed: Some(10_000.0),
        };
        assert_eq!(args.amount(), 10_000.0);
        assert_eq!(args.effective_percent(), 12.5);
    }

    #[test]
    fn percent_applies_to_credit() {
        let args = LanceArgs {
            credit_value: 60_000.0,
            percent: 25.0,
            fixed: None,
        };
        assert_eq!(args.amount(), 15_000.0);
    }
}
