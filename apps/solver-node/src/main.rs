// [apps/solver-node/src/main.rs]
/*!
 * =================================================================
 * APARATO: SOLVER NODE SHELL (V4.0 - ZENITH SHELL)
 * CLASIFICACIÓN: APPLICATION LAYER (ENTRY POINT)
 * RESPONSABILIDAD: BOOTSTRAP DE ENTORNO, DESPACHO Y CÓDIGOS DE SALIDA
 *
 * Contrato de salida: 0 éxito (clave hallada o guardado completado),
 * 1 error de usuario, 2 fallo de E/S, 3 desfase de protocolo.
 * =================================================================
 */

use canguro_solver_node::cli::{CommandDirectives, Operation};
use canguro_solver_node::client::{run_client, ClientSettings};
use canguro_solver_node::local_search::run_local_search;
use canguro_solver_node::server::run_server;
use canguro_solver_node::tools::{run_export, run_info, run_merge, run_merge_dir};
use clap::Parser;
use tracing::error;

fn main() {
    let directives = CommandDirectives::parse();
    canguro_shared_atalaya::init_tracing("canguro_solver_node");

    match dispatch(directives) {
        Ok(()) => std::process::exit(0),
        Err(fault) => {
            error!("❌ [FAULT]: {:#}", fault);
            std::process::exit(exit_code_for(&fault));
        }
    }
}

fn dispatch(directives: CommandDirectives) -> anyhow::Result<()> {
    match directives.operation {
        Operation::Solve { config_file, checkpoint, compute, key_output, max_step } => {
            run_local_search(
                &config_file,
                &checkpoint,
                &compute,
                key_output.as_deref(),
                max_step,
            )
            .map(|_outcome| ())
        }
        Operation::Server { config_file, port, checkpoint, dp_size, key_output } => {
            run_server(&config_file, port, &checkpoint, dp_size, key_output.as_deref())
        }
        Operation::Client {
            server_address,
            compute,
            work_file,
            input_work,
            save_period_seconds,
            network_timeout_ms,
            worker_label,
        } => run_client(
            ClientSettings {
                server_address,
                work_file,
                input_work,
                save_period_seconds,
                network_timeout_ms,
                worker_label,
            },
            &compute,
        ),
        Operation::Merge { file1, file2, dest } => run_merge(&file1, &file2, &dest),
        Operation::MergeDir { directory, dest } => run_merge_dir(&directory, &dest),
        Operation::Info { file } => run_info(&file),
        Operation::Export { file, tame_output, wild_output } => {
            run_export(&file, &tame_output, &wild_output)
        }
    }
}

/// Mapea la cadena de causas al contrato de códigos de salida.
fn exit_code_for(fault: &anyhow::Error) -> i32 {
    for cause in fault.chain() {
        if let Some(transport) = cause.downcast_ref::<canguro_infra_transport::TransportError>() {
            return match transport {
                canguro_infra_transport::TransportError::Io(_) => 2,
                _ => 3,
            };
        }
        if let Some(vault) = cause.downcast_ref::<canguro_core_vault::VaultError>() {
            return match vault {
                canguro_core_vault::VaultError::Io(_) => 2,
                _ => 1,
            };
        }
        if let Some(model) = cause.downcast_ref::<canguro_domain_models::ModelError>() {
            return match model {
                canguro_domain_models::ModelError::Io(_) => 2,
                _ => 1,
            };
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return 2;
        }
    }
    1
}
