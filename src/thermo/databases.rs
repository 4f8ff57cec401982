//! Embedded thermodynamic databases and the load-or-create helper.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::AppError;
use crate::thermo::tdb::Database;

pub const FE_C_FILE: &str = "fe_c.tdb";
pub const FE_CR_C_FILE: &str = "fe_cr_c.tdb";

/// Simplified Fe-C model: LIQUID, BCC_A2, FCC_A1, CEMENTITE and GRAPHITE.
pub const FE_C_TDB: &str = r#"
$ Simplified Fe-C database for educational use
$ Based on literature data

ELEMENT FE BLANK 0.0 0.0 0.0 !
ELEMENT C  BLANK 0.0 0.0 0.0 !
ELEMENT VA BLANK 0.0 0.0 0.0 !

FUNCTION GHSERFE 298.15
    +1225.7+124.134*T-23.5143*T*LN(T)-0.00439752*T**2-5.8927E-8*T**3
    +77359*T**(-1); 1811.0 Y
    -25383.581+299.31255*T-46.0*T*LN(T)+2.29603E+31*T**(-9); 6000.0 N !

FUNCTION GHSERCC 298.15
    -17368.441+170.73*T-24.3*T*LN(T)-0.00437791*T**2+1.2116E-7*T**3
    -2.6434E+5*T**(-1); 6000.0 N !

TYPE_DEFINITION % SEQ * !
DEFINE_SYSTEM_DEFAULT ELEMENT 2 !
DEFAULT_COMMAND DEFINE_SYSTEM_ELEMENT VA !

PHASE LIQUID:L % 1 1.0 !
CONSTITUENT LIQUID:L : FE,C : !
PARAMETER G(LIQUID,FE;0) 298.15 +GHSERFE+12040.17-6.55843*T; 6000.0 N !
PARAMETER G(LIQUID,C;0) 298.15 +GHSERCC+25000-10*T; 6000.0 N !
PARAMETER G(LIQUID,FE,C;0) 298.15 -124320+28.5*T; 6000.0 N !

PHASE BCC_A2 % 2 1 3 !
CONSTITUENT BCC_A2 : FE : C,VA : !
PARAMETER G(BCC_A2,FE:VA;0) 298.15 +GHSERFE; 6000.0 N !
PARAMETER G(BCC_A2,FE:C;0) 298.15 +GHSERFE+GHSERCC+80000-40*T; 6000.0 N !

PHASE FCC_A1 % 2 1 1 !
CONSTITUENT FCC_A1 : FE : C,VA : !
PARAMETER G(FCC_A1,FE:VA;0) 298.15 +GHSERFE-1462.4+8.282*T-1.15*T*LN(T)+6.4E-4*T**2; 6000.0 N !
PARAMETER G(FCC_A1,FE:C;0) 298.15 +GHSERFE+GHSERCC+77207-15.877*T; 6000.0 N !
PARAMETER G(FCC_A1,FE:C,VA;0) 298.15 +40000; 6000.0 N !

PHASE CEMENTITE % 2 3 1 !
CONSTITUENT CEMENTITE : FE : C : !
PARAMETER G(CEMENTITE,FE:C;0) 298.15 
    +3*GHSERFE+GHSERCC+13500; 6000.0 N !

PHASE GRAPHITE % 1 1.0 !
CONSTITUENT GRAPHITE : C : !
PARAMETER G(GRAPHITE,C;0) 298.15 +GHSERCC; 6000.0 N !
"#;

/// Simplified Fe-Cr-C model for Type 410 stainless steel.
pub const FE_CR_C_TDB: &str = r#"
$ Simplified Fe-Cr-C database for Type 410 stainless steel
$ For educational purposes only

ELEMENT FE BLANK 0.0 0.0 0.0 !
ELEMENT CR BLANK 0.0 0.0 0.0 !
ELEMENT C  BLANK 0.0 0.0 0.0 !
ELEMENT VA BLANK 0.0 0.0 0.0 !

FUNCTION GHSERFE 298.15
    +1225.7+124.134*T-23.5143*T*LN(T)-0.00439752*T**2-5.8927E-8*T**3
    +77359*T**(-1); 1811.0 Y
    -25383.581+299.31255*T-46.0*T*LN(T)+2.29603E+31*T**(-9); 6000.0 N !

FUNCTION GHSERCR 298.15
    -8856.94+157.48*T-26.908*T*LN(T)+0.00189435*T**2-1.47721E-6*T**3
    +139250*T**(-1); 2180.0 Y
    -34869.344+344.18*T-50.0*T*LN(T)-2.88526E+32*T**(-9); 6000.0 N !

FUNCTION GHSERCC 298.15
    -17368.441+170.73*T-24.3*T*LN(T)-0.00437791*T**2+1.2116E-7*T**3
    -2.6434E+5*T**(-1); 6000.0 N !

TYPE_DEFINITION % SEQ * !
DEFINE_SYSTEM_DEFAULT ELEMENT 2 !
DEFAULT_COMMAND DEFINE_SYSTEM_ELEMENT VA !

PHASE LIQUID:L % 1 1.0 !
CONSTITUENT LIQUID:L : FE,CR,C : !
PARAMETER G(LIQUID,FE;0) 298.15 +GHSERFE+12040.17-6.55843*T; 6000.0 N !
PARAMETER G(LIQUID,CR;0) 298.15 +GHSERCR+24339.955-11.420225*T; 6000.0 N !
PARAMETER G(LIQUID,C;0) 298.15 +GHSERCC+25000-10*T; 6000.0 N !

PHASE BCC_A2 % 2 1 3 !
CONSTITUENT BCC_A2 : FE,CR : C,VA : !
PARAMETER G(BCC_A2,FE:VA;0) 298.15 +GHSERFE; 6000.0 N !
PARAMETER G(BCC_A2,CR:VA;0) 298.15 +GHSERCR; 6000.0 N !
PARAMETER G(BCC_A2,FE:C;0) 298.15 +GHSERFE+GHSERCC+80000-40*T; 6000.0 N !
PARAMETER G(BCC_A2,CR:C;0) 298.15 +GHSERCR+GHSERCC+100000-50*T; 6000.0 N !
PARAMETER G(BCC_A2,FE,CR:VA;0) 298.15 +20500-9.68*T; 6000.0 N !

PHASE FCC_A1 % 2 1 1 !
CONSTITUENT FCC_A1 : FE,CR : C,VA : !
PARAMETER G(FCC_A1,FE:VA;0) 298.15 +GHSERFE-1462.4+8.282*T-1.15*T*LN(T)+6.4E-4*T**2; 6000.0 N !
PARAMETER G(FCC_A1,CR:VA;0) 298.15 +GHSERCR+7284+0.163*T; 6000.0 N !
PARAMETER G(FCC_A1,FE:C;0) 298.15 +GHSERFE+GHSERCC+77207-15.877*T; 6000.0 N !
PARAMETER G(FCC_A1,CR:C;0) 298.15 +GHSERCR+GHSERCC+70000-20*T; 6000.0 N !

PHASE CEMENTITE % 2 3 1 !
CONSTITUENT CEMENTITE : FE,CR : C : !
PARAMETER G(CEMENTITE,FE:C;0) 298.15 +3*GHSERFE+GHSERCC+13500; 6000.0 N !
PARAMETER G(CEMENTITE,CR:C;0) 298.15 +3*GHSERCR+GHSERCC+20000; 6000.0 N !

PHASE M23C6 % 2 23 6 !
CONSTITUENT M23C6 : CR,FE : C : !
PARAMETER G(M23C6,CR:C;0) 298.15 +23*GHSERCR+6*GHSERCC-521983+3622.24*T-620.965*T*LN(T)
    -0.126431*T**2; 6000.0 N !
PARAMETER G(M23C6,FE:C;0) 298.15 +23*GHSERFE+6*GHSERCC-300000; 6000.0 N !

PHASE M7C3 % 2 7 3 !
CONSTITUENT M7C3 : CR,FE : C : !
PARAMETER G(M7C3,CR:C;0) 298.15 +7*GHSERCR+3*GHSERCC-201690+1103.128*T-190.177*T*LN(T)
    -0.0578207*T**2; 6000.0 N !
PARAMETER G(M7C3,FE:C;0) 298.15 +7*GHSERFE+3*GHSERCC-150000; 6000.0 N !

PHASE M3C % 2 3 1 !
CONSTITUENT M3C : CR,FE : C : !
PARAMETER G(M3C,CR:C;0) 298.15 +3*GHSERCR+GHSERCC-100000+40*T; 6000.0 N !
PARAMETER G(M3C,FE:C;0) 298.15 +3*GHSERFE+GHSERCC+13500; 6000.0 N !
"#;

/// Parse `path`, writing `contents` to it first when the file does not exist.
///
/// An existing file is never overwritten, so a hand-edited database survives
/// later runs.
pub fn load_or_create(path: &Path, contents: &str) -> Result<Database, AppError> {
    if path.exists() {
        info!(path = %path.display(), "loading database");
    } else {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::new(2, format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
        fs::write(path, contents).map_err(|e| {
            AppError::new(2, format!("Failed to write database {}: {e}", path.display()))
        })?;
        info!(path = %path.display(), "created simplified database");
    }

    let db = Database::from_file(path)?;
    info!(
        elements = ?db.element_names(),
        phases = ?db.phase_names(),
        "database loaded"
    );
    Ok(db)
}
