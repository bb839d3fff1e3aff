//! Built-in rule catalog for COS and STIS reference tables.

use super::spec::RuleSpec;
use crate::error::RuleError;
use crate::predicate::ComparisonSpec;

/// Rule selecting rows by plain equality on `fields`, honoring `wildcards`.
fn equality_rule(
    name: &str,
    fields: &[&str],
    wildcards: &[String],
) -> Result<RuleSpec, RuleError> {
    RuleSpec::new(
        name,
        fields
            .iter()
            .map(|field| (*field, ComparisonSpec::equals(wildcards.iter().cloned()))),
    )
}

const COS_SEGMENT: &[&str] = &["segment"];
const COS_FULLMODE: &[&str] = &["opt_elem", "cenwave", "aperture"];
const COS_OPT_ELEM: &[&str] = &["opt_elem"];
const COS_DISPTAB: &[&str] = &["opt_elem", "cenwave"];
const COS_LAMPTAB: &[&str] = &["opt_elem", "cenwave", "fpoffset"];
const COS_TDSTAB: &[&str] = &["opt_elem", "aperture"];

const STIS_OPT_ELEM: &[&str] = &["opt_elem"];
const STIS_APERTURE: &[&str] = &["aperture"];
const STIS_CENWAVE: &[&str] = &["opt_elem", "cenwave"];
const STIS_FULLMODE: &[&str] = &["opt_elem", "cenwave", "aperture"];
const STIS_CCDTAB: &[&str] = &["ccdamp", "ccdgain", "ccdoffst", "binaxis1", "binaxis2"];
const STIS_LAMPTAB: &[&str] = &["opt_elem", "lampset", "sclamp"];
const STIS_MLINTAB: &[&str] = &["detector"];
const STIS_WCPTAB: &[&str] = &["opt_elem", "detector"];

/// `(instrument, filekind, rule name, mode fields)` for every built-in rule.
const CATALOG: &[(&str, &str, &str, &[&str])] = &[
    ("cos", "bpixtab", "COSSegment", COS_SEGMENT),
    ("cos", "brsttab", "COSSegment", COS_SEGMENT),
    ("cos", "deadtab", "COSSegment", COS_SEGMENT),
    ("cos", "disptab", "COSDISPTAB", COS_DISPTAB),
    ("cos", "fluxtab", "COSFullmode", COS_FULLMODE),
    ("cos", "lamptab", "COSLAMPTAB", COS_LAMPTAB),
    ("cos", "phatab", "COSOpt_elem", COS_OPT_ELEM),
    ("cos", "spwcstab", "COSFullmode", COS_FULLMODE),
    ("cos", "tdstab", "COSTDSTAB", COS_TDSTAB),
    ("cos", "walktab", "COSSegment", COS_SEGMENT),
    ("cos", "wcptab", "COSOpt_elem", COS_OPT_ELEM),
    ("cos", "xtractab", "COSFullmode", COS_FULLMODE),
    ("stis", "apdestab", "STISaperture", STIS_APERTURE),
    ("stis", "apertab", "STISaperture", STIS_APERTURE),
    ("stis", "bpixtab", "STISopt_elem", STIS_OPT_ELEM),
    ("stis", "ccdtab", "STISCCDTAB", STIS_CCDTAB),
    ("stis", "cdstab", "STISopt_elem", STIS_OPT_ELEM),
    ("stis", "disptab", "STIScenwave", STIS_CENWAVE),
    ("stis", "echsctab", "STISopt_elem", STIS_OPT_ELEM),
    ("stis", "exstab", "STISopt_elem", STIS_OPT_ELEM),
    ("stis", "halotab", "STISopt_elem", STIS_OPT_ELEM),
    ("stis", "lamptab", "STISLAMPTAB", STIS_LAMPTAB),
    ("stis", "mlintab", "STISMLINTAB", STIS_MLINTAB),
    ("stis", "phottab", "STIScenwave", STIS_CENWAVE),
    ("stis", "riptab", "STISopt_elem", STIS_OPT_ELEM),
    ("stis", "sdctab", "STISfullmode", STIS_FULLMODE),
    ("stis", "sptrctab", "STIScenwave", STIS_CENWAVE),
    ("stis", "srwtab", "STISopt_elem", STIS_OPT_ELEM),
    ("stis", "tdstab", "STISopt_elem", STIS_OPT_ELEM),
    ("stis", "teltab", "STISopt_elem", STIS_OPT_ELEM),
    ("stis", "wcptab", "STISWCPTAB", STIS_WCPTAB),
    ("stis", "xtractab", "STISfullmode", STIS_FULLMODE),
];

/// Materialize the catalog as `(instrument, filekind, rule)` triples whose
/// mode fields all use `wildcards`.
pub(crate) fn catalog(
    wildcards: &[String],
) -> Result<Vec<(&'static str, &'static str, RuleSpec)>, RuleError> {
    CATALOG
        .iter()
        .map(|(instrument, kind, name, fields)| {
            Ok((*instrument, *kind, equality_rule(name, fields, wildcards)?))
        })
        .collect()
}
