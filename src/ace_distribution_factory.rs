// Secondary distributions decoded from ACE blocks
//
// DLW/DNED energy laws, AND angular tables, NU/DNU multiplicities and BDD
// precursor data. All locators in these blocks are 1-based and relative to
// the start of their block.

use crate::ace::{BlockReader, XssNeutronData};
use crate::distribution::{Interpolation, PolynomialDistribution, TabularDistribution, UnivariateDistribution};
use crate::error::CollisionResult;
use crate::fission::{DelayedNeutronEmissionDistribution, DelayedNeutronGroup, FissionNeutronMultiplicityDistribution};
use crate::reaction_type::NuclearReactionType;
use crate::scattering::{EnergyLaw, NuclearScatteringDistribution, ReferenceFrame};
use crate::stats::{tabular_cosine_distribution, AngularDistribution, EnergyDependentAngularDistribution};

/// Number of cosine boundaries in a 32 equiprobable bin table
const EQUIPROBABLE_BOUNDARIES: usize = 33;

/// Read an ENDF TAB1 record (NR, NBT(NR), INT(NR), NE, X(NE), Y(NE)) at
/// `start`. Only a single lin-lin or histogram region is supported.
///
/// Returns the distribution and the index just past the record.
pub(crate) fn read_tab1(reader: &BlockReader, start: usize) -> CollisionResult<(TabularDistribution, usize)> {
    let regions = reader.count(start)?;
    let interpolation = match regions {
        0 => Interpolation::LinLin,
        1 => {
            let code = reader.signed_integer(start + 2)?;
            Interpolation::from_endf_code(code)
                .ok_or_else(|| reader.unsupported(format!("interpolation scheme {}", code)))?
        }
        n => {
            return Err(reader.unsupported(format!(
                "{} interpolation regions found where only one is supported",
                n
            )))
        }
    };
    let count_index = start + 1 + 2 * regions;
    let count = reader.count(count_index)?;
    if count == 0 {
        return Err(reader.malformed("at least one tabulated point", "0"));
    }
    let x = reader.to_vec(count_index + 1, count)?;
    let y = reader.to_vec(count_index + 1 + count, count)?;
    let distribution = TabularDistribution::new(interpolation, x, y)?;
    Ok((distribution, count_index + 1 + 2 * count))
}

/// Decode the energy law whose 0-based locator within `dlw` is `location`
pub(crate) fn read_energy_law(dlw: &BlockReader, location: usize, awr: f64) -> CollisionResult<EnergyLaw> {
    let next_law = dlw.value(location)?;
    if next_law != 0.0 {
        return Err(dlw.unsupported("multiple energy laws for one reaction"));
    }
    let law = dlw.integer(location + 1)?;
    let data = dlw.locator(location + 2)?;

    match law {
        2 => {
            let lp = dlw.integer(data)?;
            Ok(EnergyLaw::DiscretePhoton {
                primary: lp == 2,
                photon_energy: dlw.value(data + 1)?,
                awr,
            })
        }
        3 => Ok(EnergyLaw::Level {
            threshold: dlw.value(data)?,
            mass_ratio: dlw.value(data + 1)?,
        }),
        4 => read_tabular_law(dlw, data),
        7 | 9 => {
            let (temperature, next) = read_tab1(dlw, data)?;
            let restriction = dlw.value(next)?;
            let temperature = UnivariateDistribution::Tabular(temperature);
            Ok(if law == 7 {
                EnergyLaw::Maxwell {
                    temperature,
                    restriction,
                }
            } else {
                EnergyLaw::Evaporation {
                    temperature,
                    restriction,
                }
            })
        }
        11 => {
            let (a, next) = read_tab1(dlw, data)?;
            let (b, next) = read_tab1(dlw, next)?;
            Ok(EnergyLaw::Watt {
                a: UnivariateDistribution::Tabular(a),
                b: UnivariateDistribution::Tabular(b),
                restriction: dlw.value(next)?,
            })
        }
        other => Err(dlw.unsupported(format!("energy law {}", other))),
    }
}

fn read_tabular_law(dlw: &BlockReader, data: usize) -> CollisionResult<EnergyLaw> {
    let regions = dlw.count(data)?;
    if regions > 1 || (regions == 1 && dlw.signed_integer(data + 2)? != 2) {
        return Err(dlw.unsupported("law 4 incident energies must use one lin-lin region"));
    }
    let count_index = data + 1 + 2 * regions;
    let count = dlw.count(count_index)?;
    if count == 0 {
        return Err(dlw.malformed("at least one incident energy for law 4", "0"));
    }
    let incident_energies = dlw.to_vec(count_index + 1, count)?;

    let mut distributions = Vec::with_capacity(count);
    for k in 0..count {
        let location = dlw.locator(count_index + 1 + count + k)?;
        let intt = dlw.integer(location)?;
        if intt >= 10 {
            return Err(dlw.unsupported(format!(
                "law 4 table with {} discrete lines",
                intt / 10
            )));
        }
        let interpolation = Interpolation::from_endf_code(intt as i64)
            .ok_or_else(|| dlw.unsupported(format!("interpolation scheme {}", intt)))?;
        let points = dlw.count(location + 1)?;
        let outgoing = dlw.to_vec(location + 2, points)?;
        let pdf = dlw.to_vec(location + 2 + points, points)?;
        distributions.push(TabularDistribution::new(interpolation, outgoing, pdf)?);
    }

    if !crate::utilities::is_strictly_ascending(&incident_energies) {
        return Err(dlw.malformed("ascending law 4 incident energies", format!("{:?}", incident_energies)));
    }
    Ok(EnergyLaw::Tabular {
        incident_energies,
        distributions,
    })
}

/// Decode the angular table for a raw LAND entry (0 isotropic, -1 coupled)
pub(crate) fn read_angular_distribution(
    and_block: &BlockReader,
    locb: i64,
) -> CollisionResult<EnergyDependentAngularDistribution> {
    if locb == 0 {
        return Ok(EnergyDependentAngularDistribution::isotropic());
    }
    if locb < 0 {
        return Err(and_block.unsupported("correlated energy-angle data (LOCB = -1)"));
    }
    let start = locb as usize - 1;
    let count = and_block.count(start)?;
    if count == 0 {
        return Err(and_block.malformed("at least one incident energy", "0"));
    }
    let energies = and_block.to_vec(start + 1, count)?;

    let mut distributions = Vec::with_capacity(count);
    for k in 0..count {
        let lc = and_block.signed_integer(start + 1 + count + k)?;
        let distribution = if lc == 0 {
            AngularDistribution::Isotropic
        } else if lc > 0 {
            let boundaries = and_block.to_vec(lc as usize - 1, EQUIPROBABLE_BOUNDARIES)?;
            AngularDistribution::equiprobable_bins(boundaries)?
        } else {
            let location = (-lc) as usize - 1;
            let jj = and_block.signed_integer(location)?;
            let interpolation = Interpolation::from_endf_code(jj)
                .ok_or_else(|| and_block.unsupported(format!("cosine interpolation scheme {}", jj)))?;
            let points = and_block.count(location + 1)?;
            let cosines = and_block.to_vec(location + 2, points)?;
            let pdf = and_block.to_vec(location + 2 + points, points)?;
            tabular_cosine_distribution(interpolation, cosines, pdf)?
        };
        distributions.push(distribution);
    }
    EnergyDependentAngularDistribution::new(energies, distributions)
}

/// Builds the outgoing distributions of neutron-producing reactions
#[derive(Debug, Clone, Copy)]
pub struct ScatteringDistributionAceFactory<'a> {
    data: &'a XssNeutronData,
    free_gas_threshold: f64,
}

impl<'a> ScatteringDistributionAceFactory<'a> {
    pub fn new(data: &'a XssNeutronData, free_gas_threshold: f64) -> Self {
        ScatteringDistributionAceFactory {
            data,
            free_gas_threshold,
        }
    }

    /// Elastic scattering uses the first LAND entry and no energy law
    pub fn create_elastic(&self) -> CollisionResult<NuclearScatteringDistribution> {
        let land = BlockReader::new(&self.data.table_name, "LAND", &self.data.land);
        let and_block = BlockReader::new(&self.data.table_name, "AND", &self.data.and_block);
        let locb = if land.is_empty() { 0 } else { land.signed_integer(0)? };
        Ok(NuclearScatteringDistribution::Elastic {
            awr: self.data.atomic_weight_ratio,
            angular: read_angular_distribution(&and_block, locb)?,
            free_gas_threshold: self.free_gas_threshold,
        })
    }

    /// Distribution of the MTR reaction at `ordinal` (its LAND entry is
    /// `ordinal + 1`, its LDLW entry `ordinal`)
    pub fn create(
        &self,
        reaction_type: NuclearReactionType,
        ordinal: usize,
        frame: ReferenceFrame,
    ) -> CollisionResult<NuclearScatteringDistribution> {
        let table = self.data.table_name.as_str();
        let land = BlockReader::new(table, "LAND", &self.data.land);
        let and_block = BlockReader::new(table, "AND", &self.data.and_block);
        let ldlw = BlockReader::new(table, "LDLW", &self.data.ldlw);
        let dlw = BlockReader::new(table, "DLW", &self.data.dlw);

        let angular = read_angular_distribution(&and_block, land.signed_integer(ordinal + 1)?)?;
        let energy_law = read_energy_law(&dlw, ldlw.locator(ordinal)?, self.data.atomic_weight_ratio)?;

        if matches!(energy_law, EnergyLaw::Level { .. }) && frame != ReferenceFrame::CenterOfMass {
            return Err(dlw.unsupported(format!(
                "{} uses law 3, which must be in the CM system, but the lab frame was specified",
                reaction_type
            )));
        }

        Ok(NuclearScatteringDistribution::Uncorrelated {
            awr: self.data.atomic_weight_ratio,
            energy_law,
            angular,
            frame,
        })
    }
}

/// Read one NU curve (LNU 1 polynomial, LNU 2 tabular) at `start`
fn read_multiplicity_curve(nu: &BlockReader, start: usize) -> CollisionResult<UnivariateDistribution> {
    match nu.integer(start)? {
        1 => {
            let count = nu.count(start + 1)?;
            let coefficients = nu.to_vec(start + 2, count)?;
            Ok(UnivariateDistribution::Polynomial(PolynomialDistribution::new(
                coefficients,
                0.0,
                f64::MAX,
            )?))
        }
        2 => Ok(UnivariateDistribution::Tabular(read_tab1(nu, start + 1)?.0)),
        other => Err(nu.unsupported(format!("multiplicity form LNU = {}", other))),
    }
}

/// Fission multiplicity from the NU block and, when present, the DNU block.
///
/// A negative first NU entry means prompt and total curves follow; the
/// magnitude is the prompt curve's length.
pub fn create_fission_multiplicity(
    data: &XssNeutronData,
) -> CollisionResult<Option<FissionNeutronMultiplicityDistribution>> {
    if data.nu.is_empty() {
        return Ok(None);
    }
    let nu = BlockReader::new(&data.table_name, "NU", &data.nu);
    let dnu = BlockReader::new(&data.table_name, "DNU", &data.dnu);

    let first = nu.signed_integer(0)?;
    let (prompt, total) = if first < 0 {
        let prompt = read_multiplicity_curve(&nu, 1)?;
        let total = read_multiplicity_curve(&nu, 1 + first.unsigned_abs() as usize)?;
        (Some(prompt), total)
    } else {
        (None, read_multiplicity_curve(&nu, 0)?)
    };

    let delayed = if dnu.is_empty() {
        None
    } else {
        if dnu.integer(0)? != 2 {
            return Err(dnu.unsupported("delayed multiplicity must be tabular (LNU = 2)"));
        }
        Some(read_multiplicity_curve(&dnu, 0)?)
    };

    Ok(Some(match (prompt, delayed) {
        (Some(prompt), Some(delayed)) => FissionNeutronMultiplicityDistribution::Complete {
            total,
            prompt,
            delayed,
        },
        (Some(prompt), None) => FissionNeutronMultiplicityDistribution::PromptTotal { prompt, total },
        (None, Some(delayed)) => FissionNeutronMultiplicityDistribution::DelayedTotal { delayed, total },
        // no delayed data: every neutron is prompt
        (None, None) => FissionNeutronMultiplicityDistribution::PromptTotal {
            prompt: total.clone(),
            total,
        },
    }))
}

/// Delayed-neutron emission from the BDD precursor block and the DNEDL/DNED
/// energy laws; None when the table has no DNEDL block
pub fn create_delayed_emission(data: &XssNeutronData) -> CollisionResult<Option<DelayedNeutronEmissionDistribution>> {
    if data.dnedl.is_empty() {
        return Ok(None);
    }
    let table = data.table_name.as_str();
    let bdd = BlockReader::new(table, "BDD", &data.bdd);
    let dnedl = BlockReader::new(table, "DNEDL", &data.dnedl);
    let dned = BlockReader::new(table, "DNED", &data.dned);

    let mut groups = Vec::with_capacity(dnedl.len());
    let mut cursor = 0;
    for group in 0..dnedl.len() {
        let decay_constant = bdd.value(cursor)?;
        let (probability, next) = read_tab1(&bdd, cursor + 1)?;
        cursor = next;
        let energy_law = read_energy_law(&dned, dnedl.locator(group)?, data.atomic_weight_ratio)?;
        groups.push(DelayedNeutronGroup {
            decay_constant,
            probability: UnivariateDistribution::Tabular(probability),
            energy_law,
        });
    }
    log::debug!("{}: {} delayed-neutron precursor groups", table, groups.len());
    Ok(Some(DelayedNeutronEmissionDistribution::new(groups)?))
}
