use rand::Rng;
use rand::prelude::SeedableRng;
use rand_pcg::Pcg64;
use std::sync::Arc;
use symbios_pareto::{
    Creator, Decoder, Evaluator, Objective, Objectives,
    archive::{Archive, crowding::CrowdingArchive},
    completer::{IndividualCompleter, parallel::ParallelCompleter},
    control::{Control, Lifecycle},
    genotype::{Genotype, OperatorTable},
    individual::IndividualFactory,
    population::Population,
};

const VARIABLES: usize = 30;
const POPULATION: usize = 100;
const GENERATIONS: usize = 200;

/// Uniform reals in [0, 1].
struct UnitCube;
impl Creator for UnitCube {
    type Genotype = Genotype;
    fn create<R: Rng>(&self, rng: &mut R) -> Genotype {
        Genotype::Double {
            values: (0..VARIABLES).map(|_| rng.random()).collect(),
            lower: 0.0,
            upper: 1.0,
        }
    }
}

struct Reals;
impl Decoder<Genotype> for Reals {
    type Phenotype = Vec<f64>;
    fn decode(&self, genotype: &Genotype) -> Vec<f64> {
        match genotype.as_doubles() {
            Ok(values) => values.to_vec(),
            Err(e) => panic!("ZDT1 needs a double genotype: {e}"),
        }
    }
}

/// ZDT1: convex front f2 = 1 - sqrt(f1) for g = 1.
struct Zdt1;
impl Evaluator<Vec<f64>> for Zdt1 {
    fn evaluate(&self, x: &Vec<f64>) -> Objectives {
        let f1 = x[0];
        let g = 1.0 + 9.0 * x[1..].iter().sum::<f64>() / (x.len() - 1) as f64;
        let f2 = g * (1.0 - (f1 / g).sqrt());
        Objectives::new()
            .with(Objective::minimize("f1"), f1)
            .with(Objective::minimize("f2"), f2)
    }
}

fn main() -> symbios_pareto::Result<()> {
    let mut rng = Pcg64::seed_from_u64(42);
    let operators = OperatorTable::standard();
    let factory = IndividualFactory::<UnitCube, Vec<f64>>::new(UnitCube, 42);
    let control = Arc::new(Control::new());
    let completer = Arc::new(ParallelCompleter::new(Reals, Zdt1, Arc::clone(&control), 4)?);
    let lifecycle = Lifecycle::new();
    lifecycle.add_listener(completer.clone());

    let mut archive = CrowdingArchive::new(POPULATION)?;
    let mut population: Population<Genotype, Vec<f64>> =
        factory.create_batch(POPULATION).into_iter().collect();

    lifecycle.started();
    for generation in 0..GENERATIONS {
        completer.complete_population(&population)?;
        archive.update_from(&population);

        if generation % 20 == 0 {
            println!("Gen {:>3}: front size {}", generation, archive.len());
        }

        let parents = archive.to_vec();
        population.clear();
        for _ in 0..POPULATION {
            let a = &parents[rng.random_range(0..parents.len())];
            let b = &parents[rng.random_range(0..parents.len())];
            let (Some(left), Some(right)) = (a.genotype(), b.genotype()) else {
                continue;
            };
            let mut child = operators.crossover(left, right, &mut rng)?;
            operators.mutate(&mut child, &mut rng, 1.0 / VARIABLES as f64)?;

            let individual = factory.create_empty();
            individual.set_genotype(child)?;
            population.add(individual);
        }
    }
    lifecycle.stopped();

    let mut front: Vec<(f64, f64)> = archive
        .iter()
        .filter_map(|i| {
            let objectives = i.objectives()?;
            Some((
                objectives.get(&Objective::minimize("f1")).ok()?.as_f64()?,
                objectives.get(&Objective::minimize("f2")).ok()?.as_f64()?,
            ))
        })
        .collect();
    front.sort_by(|a, b| a.0.total_cmp(&b.0));

    println!("\nFinal front ({} points):", front.len());
    for (f1, f2) in front.iter().step_by(10) {
        println!("  f1 = {:.3}, f2 = {:.3} (optimum {:.3})", f1, f2, 1.0 - f1.sqrt());
    }
    Ok(())
}
