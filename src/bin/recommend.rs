/**
 * CoocRec
 * Copyright (C) 2019 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::env;
use std::process;

use getopts::Options;

use coocrec::JobConfig;

fn main() {

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("i", "inputfile", "Input file name (required). The input consists of \
        preferences of users for items. The input file must contain a user, item and value \
        triple per line, separated by tabs.", "PATH");
    opts.optopt("o", "outputfile", "Output file name (optional, recommendations will be \
        written to stdout by default).", "PATH");
    opts.optopt("t", "temp-dir", "Directory for the persisted per-phase datasets (optional, \
        defaults to 'temp').", "PATH");
    opts.optopt("n", "num-recommendations", "Number of recommendations to compute per user \
        (optional, defaults to 10).", "NUMBER");
    opts.optopt("k", "max-prefs-per-user", "Maximum number of preferences considered per user, \
        smaller preferences are pruned before the co-occurrence expansion (optional, defaults \
        to 10).", "NUMBER");
    opts.optopt("u", "users-file", "File with one user id per line to restrict the \
        recommendation computation to (optional).", "PATH");
    opts.optflag("b", "boolean-data", "Treat the input as having no value column, every \
        preference counts as 1.0.");
    opts.optflag("r", "resume", "Skip leading phases already marked complete in the temp \
        directory from an earlier run.");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    if !matches.opt_present("i") {
        return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify an inputfile via --inputfile."),
        );
    }

    let input_path = matches.opt_str("i").unwrap();
    let temp_dir = matches.opt_str("t").unwrap_or_else(|| String::from("temp"));

    let num_recommendations: usize = match matches.opt_get_default("n", 10) {
        Ok(n) => n,
        Err(failure) => {
            let hint = format!("Problem with option 'n': {}", failure.to_string());
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let max_prefs_per_user: usize = match matches.opt_get_default("k", 10) {
        Ok(k) => k,
        Err(failure) => {
            let hint = format!("Problem with option 'k': {}", failure.to_string());
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let mut config = JobConfig::new(&input_path, &temp_dir);
    config.output_path = matches.opt_str("o");
    config.num_recommendations = num_recommendations;
    config.max_prefs_per_user = max_prefs_per_user;
    config.boolean_data = matches.opt_present("b");
    config.users_file = matches.opt_str("u");
    config.resume = matches.opt_present("r");
    config.pool_size = num_cpus::get();

    if let Err(failure) = coocrec::run(&config) {
        eprintln!("Run failed: {}", failure);
        process::exit(1);
    }
}

fn print_usage_and_exit(
    program: &str,
    opts: Options,
    hint: Option<&str>
) {

    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));
}
