use clap::{ArgAction, Args};
use consorcio_core::FilterCriteria;

use super::plan::CategoryArg;

/// Filtros do catálogo; todos combinados (E lógico).
#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Tipo do bem (omitido = todos)
    #[arg(long, value_enum)]
    pub category: Option<CategoryArg>,
    /// Valor mínimo da carta
    #[arg(long, value_name = "VALOR")]
    pub credit_min: Option<f64>,
    /// Valor máximo da carta
    #[arg(long, value_name = "VALOR")]
    pub credit_max: Option<f64>,
    /// Prazo mínimo em meses
    #[arg(long, value_name = "MESES")]
    pub term_min: Option<u32>,
    /// Prazo máximo em meses
    #[arg(long, value_name = "MESES")]
    pub term_max: Option<u32>,
    /// Média de lance mínima (%)
    #[arg(long, value_name = "PCT")]
    pub bid_min: Option<f64>,
    /// Média de lance máxima (%)
    #[arg(long, value_name = "PCT")]
    pub bid_max: Option<f64>,
    /// Taxa de administração máxima (%)
    #[arg(long, value_name = "PCT")]
    pub admin_fee_max: Option<f64>,
    /// Administradora (repetir flag para várias)
    #[arg(long = "administrator", action = ArgAction::Append, value_name = "NOME")]
    pub administrators: Vec<String>,
    /// Busca livre em administradora, tipo, grupo e observações
    #[arg(long, short = 'q', value_name = "TEXTO")]
    pub query: Option<String>,
}

impl SearchArgs {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            category: self.category.map(Into::into),
            credit_min: self.credit_min,
            credit_max: self.credit_max,
            term_min: self.term_min,
            term_max: self.term_max,
            bid_min: self.bid_min,
            bid_max: self.bid_max,
            admin_fee_max: self.admin_fee_max,
            administrators: self.administrators.iter().cloned().collect(),
            search: self.query.clone().unwrap_or_default(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    /// Planos a comparar, na ordem das colunas (máximo 4)
    #[arg(value_name = "ID", required = true, num_args = 1..)]
    pub ids: Vec<String>,
}
