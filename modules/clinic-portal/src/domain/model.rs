use clinica_security::Role;

/// Row of the shared login table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalAccount {
    pub id: i64,
    pub nickname: String,
    pub password_hash: Option<String>,
    /// Entity discriminator, e.g. `AdministradorClinica`.
    pub dtype: String,
    pub tenant_id: Option<String>,
    pub role: Option<String>,
}

impl PortalAccount {
    /// Role column if set, otherwise derived from the account kind.
    #[must_use]
    pub fn effective_role(&self) -> String {
        if let Some(role) = self.role.as_deref().filter(|r| !r.trim().is_empty()) {
            return role.to_owned();
        }
        match self.dtype.as_str() {
            "ProfesionalSalud" => Role::PROFESIONAL.to_owned(),
            "AdministradorClinica" => Role::ADMINISTRADOR.to_owned(),
            _ => "OTRO".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub token: String,
    pub role: String,
    pub tenant_id: String,
}

/// A health professional as listed in one clinic's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Professional {
    pub id: i64,
    pub nombre: String,
    pub especialidad: String,
    pub email: Option<String>,
    pub departamento: Option<String>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn account(dtype: &str, role: Option<&str>) -> PortalAccount {
        PortalAccount {
            id: 1,
            nickname: "n".to_owned(),
            password_hash: None,
            dtype: dtype.to_owned(),
            tenant_id: Some("1".to_owned()),
            role: role.map(str::to_owned),
        }
    }

    #[test]
    fn role_column_wins_over_kind() {
        assert_eq!(
            account("ProfesionalSalud", Some("ADMINISTRADOR")).effective_role(),
            "ADMINISTRADOR"
        );
        assert_eq!(account("ProfesionalSalud", None).effective_role(), "PROFESIONAL");
        assert_eq!(account("ProfesionalSalud", Some(" ")).effective_role(), "PROFESIONAL");
        assert_eq!(account("Recepcion", None).effective_role(), "OTRO");
    }
}
